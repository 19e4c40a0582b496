//! Directory operations on a confined root.

use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use crate::atomic;
use crate::config::{VaultConfig, TRASH_DIR_NAME};
use crate::entry::{modified_epoch, Entry, EntryKind};
use crate::error::{Operation, Subject, VaultError, VaultResult};
use crate::path::{base_name, validate_name, PathResolver};
use crate::remove::{remove_tree, RemovalReport};
use crate::save::SaveSettings;

/// Content of a file returned by [`FileVault::read`].
#[derive(Debug, Clone)]
pub struct FileContent {
    pub name: String,
    pub size: u64,
    pub content: Vec<u8>,
}

/// A file written by [`FileVault::write`] or [`FileVault::create`].
#[derive(Debug, Clone)]
pub struct WrittenFile {
    pub name: String,
    pub path: String,
    pub size: u64,
    pub modified: u64,
}

/// A directory created by [`FileVault::mkdir`].
#[derive(Debug, Clone)]
pub struct CreatedDir {
    pub name: String,
    pub path: String,
}

/// Result of [`FileVault::rename`].
#[derive(Debug, Clone)]
pub struct Renamed {
    pub old_name: String,
    pub new_name: String,
    pub path: String,
}

/// What [`FileVault::delete`] did with its target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeleteOutcome {
    /// Moved into the trash and recoverable
    Trashed { name: String, trash_path: String },
    /// Removed for good
    Removed { name: String, kind: EntryKind },
}

/// File operations confined to one root directory.
///
/// A vault is opened once and shared; it holds no mutable state, so every
/// method takes `&self` and is safe to call from several threads at once.
#[derive(Debug)]
pub struct FileVault {
    pub(crate) resolver: PathResolver,
    pub(crate) trash_dir: PathBuf,
    pub(crate) save: SaveSettings,
}

impl FileVault {
    /// Open a vault over `config.root`.
    ///
    /// The root (and the save root, if separate) must be existing
    /// directories. The trash directory is not created here; see
    /// [`FileVault::ensure_trash`].
    pub fn open(config: &VaultConfig) -> VaultResult<Self> {
        let resolver = PathResolver::new(&config.root)
            .map_err(|e| VaultError::io(Operation::Open, &config.root, e))?;
        let save = SaveSettings::new(config)?;
        let trash_dir = resolver.root().join(TRASH_DIR_NAME);

        tracing::info!(
            root = %resolver.root().display(),
            save_root = %save.resolver.root().display(),
            "Opened file vault"
        );

        Ok(Self {
            resolver,
            trash_dir,
            save,
        })
    }

    /// The canonical root directory.
    pub fn root(&self) -> &Path {
        self.resolver.root()
    }

    pub fn resolver(&self) -> &PathResolver {
        &self.resolver
    }

    /// Absolute path of the trash directory (which may not exist).
    pub fn trash_dir(&self) -> &Path {
        &self.trash_dir
    }

    /// List the immediate children of `dir`.
    ///
    /// Names starting with `.` are skipped. Directories come first, then
    /// files, each group sorted by name.
    pub fn list(&self, dir: &str) -> VaultResult<Vec<Entry>> {
        let path = self.resolver.resolve(dir)?;
        if !path.is_dir() {
            return Err(VaultError::InvalidDirectory {
                path: dir.to_string(),
            });
        }

        let read_dir = fs::read_dir(&path).map_err(|e| VaultError::io(Operation::List, &path, e))?;
        let mut entries = Vec::new();
        for item in read_dir {
            let item = match item {
                Ok(item) => item,
                Err(e) => {
                    tracing::warn!(dir = %path.display(), error = %e, "Skipping unreadable entry");
                    continue;
                }
            };
            let name = item.file_name().to_string_lossy().into_owned();
            if name.starts_with('.') {
                continue;
            }
            let child = item.path();
            match fs::metadata(&child) {
                Ok(meta) => entries.push(Entry::from_metadata(
                    name,
                    self.resolver.to_relative(&child),
                    &meta,
                )),
                Err(e) => {
                    tracing::warn!(path = %child.display(), error = %e, "Skipping entry without metadata");
                }
            }
        }

        entries.sort_by(|a, b| {
            b.kind
                .is_dir()
                .cmp(&a.kind.is_dir())
                .then_with(|| a.name.cmp(&b.name))
        });
        Ok(entries)
    }

    /// Read a whole regular file.
    pub fn read(&self, file: &str) -> VaultResult<FileContent> {
        let path = self.resolver.resolve(file)?;
        if !path.is_file() {
            return Err(VaultError::not_found(file, Subject::File));
        }
        let content = fs::read(&path).map_err(|e| VaultError::io(Operation::Read, &path, e))?;
        Ok(FileContent {
            name: base_name(&path),
            size: content.len() as u64,
            content,
        })
    }

    /// Replace the content of an existing regular file.
    pub fn write(&self, file: &str, content: &[u8]) -> VaultResult<WrittenFile> {
        let path = self.resolver.resolve(file)?;
        if !path.is_file() {
            return Err(VaultError::not_found(file, Subject::File));
        }
        // Write through a symlink rather than replacing it.
        let target = path
            .canonicalize()
            .map_err(|e| VaultError::io(Operation::Write, &path, e))?;

        let meta = atomic::replace_contents(&target, content)
            .map_err(|e| VaultError::io(Operation::Write, &target, e))?;
        tracing::info!(path = %target.display(), size = meta.len(), "Wrote file");

        Ok(WrittenFile {
            name: base_name(&path),
            path: self.resolver.to_relative(&path),
            size: meta.len(),
            modified: modified_epoch(&meta),
        })
    }

    /// Create a new file named `filename` in `dir`.
    ///
    /// Fails with a conflict if anything already exists under that name.
    pub fn create(&self, dir: &str, filename: &str, content: &[u8]) -> VaultResult<WrittenFile> {
        validate_name(filename, Subject::File)?;
        let dir_path = self.resolve_dir(dir)?;
        let path = dir_path.join(filename);

        let mut file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .map_err(|e| match e.kind() {
                io::ErrorKind::AlreadyExists => {
                    VaultError::already_exists(self.resolver.to_relative(&path), Subject::File)
                }
                _ => VaultError::io(Operation::Create, &path, e),
            })?;

        if let Err(e) = file.write_all(content).and_then(|()| file.sync_all()) {
            drop(file);
            if let Err(cleanup) = fs::remove_file(&path) {
                tracing::error!(
                    path = %path.display(),
                    error = %cleanup,
                    "Failed to remove partially written file"
                );
            }
            return Err(VaultError::io(Operation::Create, &path, e));
        }

        let meta = file
            .metadata()
            .map_err(|e| VaultError::io(Operation::Create, &path, e))?;
        tracing::info!(path = %path.display(), size = meta.len(), "Created file");

        Ok(WrittenFile {
            name: filename.to_string(),
            path: self.resolver.to_relative(&path),
            size: meta.len(),
            modified: modified_epoch(&meta),
        })
    }

    /// Create a directory named `dirname` in `parent`.
    pub fn mkdir(&self, parent: &str, dirname: &str) -> VaultResult<CreatedDir> {
        validate_name(dirname, Subject::Directory)?;
        let parent_path = self.resolve_dir(parent)?;
        let path = parent_path.join(dirname);

        atomic::create_dir(&path).map_err(|e| match e.kind() {
            io::ErrorKind::AlreadyExists => {
                VaultError::already_exists(self.resolver.to_relative(&path), Subject::Directory)
            }
            _ => VaultError::io(Operation::Mkdir, &path, e),
        })?;
        tracing::info!(path = %path.display(), "Created directory");

        Ok(CreatedDir {
            name: dirname.to_string(),
            path: self.resolver.to_relative(&path),
        })
    }

    /// Rename an entry within its own directory.
    pub fn rename(&self, file: &str, new_name: &str) -> VaultResult<Renamed> {
        validate_name(new_name, Subject::Entry)?;
        let path = self.resolver.resolve(file)?;
        if !atomic::occupied(&path) {
            return Err(VaultError::not_found(file, Subject::Entry));
        }
        self.ensure_not_reserved(&path, file, Operation::Rename)?;

        let old_name = base_name(&path);
        let dest = path.with_file_name(new_name);
        atomic::move_no_clobber(&path, &dest).map_err(|e| match e.kind() {
            io::ErrorKind::AlreadyExists => {
                VaultError::already_exists(self.resolver.to_relative(&dest), Subject::Entry)
            }
            _ => VaultError::io(Operation::Rename, &path, e),
        })?;
        tracing::info!(from = %path.display(), to = %dest.display(), "Renamed entry");

        Ok(Renamed {
            old_name,
            new_name: new_name.to_string(),
            path: self.resolver.to_relative(&dest),
        })
    }

    /// Delete an entry.
    ///
    /// Unless `permanent` is set the entry is moved into the trash. When no
    /// trash directory exists, or the move fails, the entry is removed
    /// permanently instead. Entries already in the trash are always removed
    /// permanently.
    pub fn delete(&self, file: &str, permanent: bool) -> VaultResult<DeleteOutcome> {
        let path = self.resolver.resolve(file)?;
        if !atomic::occupied(&path) {
            return Err(VaultError::not_found(file, Subject::Entry));
        }
        self.ensure_not_reserved(&path, file, Operation::Delete)?;

        if permanent || path.starts_with(&self.trash_dir) {
            return self.delete_permanently(&path);
        }
        self.move_to_trash(&path)
    }

    pub(crate) fn delete_permanently(&self, path: &Path) -> VaultResult<DeleteOutcome> {
        let kind = path
            .symlink_metadata()
            .map(|m| EntryKind::from_metadata(&m))
            .map_err(|e| VaultError::io(Operation::Delete, path, e))?;
        let name = base_name(path);
        self.remove_permanently(path, Operation::Delete)?;
        Ok(DeleteOutcome::Removed { name, kind })
    }

    /// Remove `path` recursively, failing if it is still present afterwards.
    pub(crate) fn remove_permanently(
        &self,
        path: &Path,
        operation: Operation,
    ) -> VaultResult<RemovalReport> {
        let mut report = remove_tree(path);
        if atomic::occupied(path) {
            let source = report
                .failures
                .pop()
                .map_or_else(|| io::Error::other("entry still present after removal"), |f| f.error);
            tracing::error!(path = %path.display(), error = %source, "Permanent removal failed");
            return Err(VaultError::io(operation, path, source));
        }
        tracing::info!(
            path = %path.display(),
            files = report.files_removed,
            dirs = report.dirs_removed,
            "Permanently removed entry"
        );
        Ok(report)
    }

    fn resolve_dir(&self, dir: &str) -> VaultResult<PathBuf> {
        let path = self.resolver.resolve(dir)?;
        if !path.is_dir() {
            return Err(VaultError::InvalidDirectory {
                path: dir.to_string(),
            });
        }
        Ok(path)
    }

    fn ensure_not_reserved(&self, path: &Path, relative: &str, operation: Operation) -> VaultResult<()> {
        if self.resolver.is_root(path) || path == self.trash_dir {
            return Err(VaultError::Reserved {
                path: relative.to_string(),
                operation,
            });
        }
        Ok(())
    }
}
