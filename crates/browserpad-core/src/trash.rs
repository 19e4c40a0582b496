//! Trash management: soft delete, listing, restore, purge.
//!
//! Trashed entries live directly under `/.trash` as
//! `{deletedAtEpochSeconds}_{originalName}`.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::atomic;
use crate::config::TRASH_DIR_NAME;
use crate::entry::{format_timestamp, now_epoch, EntryKind, TrashEntry, TrashName};
use crate::error::{Operation, Subject, VaultError, VaultResult};
use crate::ops::{DeleteOutcome, FileVault};
use crate::path::{base_name, split_extension, validate_name};

/// How many later epochs to try when a trash name is already taken.
const MAX_TRASH_NAME_ATTEMPTS: u64 = 64;

/// How many `_restored_{n}` suffixes to try before giving up.
const MAX_RESTORE_ATTEMPTS: u32 = 1000;

/// An entry moved back out of the trash.
#[derive(Debug, Clone)]
pub struct Restored {
    /// Name the entry was restored under
    pub name: String,
    pub path: String,
}

/// A trash entry removed for good.
#[derive(Debug, Clone)]
pub struct Purged {
    pub name: String,
}

/// Result of [`FileVault::empty_trash`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EmptyTrashOutcome {
    /// Whether a trash directory was present
    pub existed: bool,
    /// Number of top-level trash entries removed
    pub removed: usize,
}

impl FileVault {
    /// Create the trash directory if it does not exist.
    ///
    /// Returns true if it was created.
    pub fn ensure_trash(&self) -> VaultResult<bool> {
        match atomic::create_dir(&self.trash_dir) {
            Ok(()) => {
                tracing::info!(path = %self.trash_dir.display(), "Created trash directory");
                Ok(true)
            }
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists && self.trash_dir.is_dir() => {
                Ok(false)
            }
            Err(e) => Err(VaultError::io(Operation::Mkdir, &self.trash_dir, e)),
        }
    }

    /// Move `path` into the trash, falling back to permanent removal.
    pub(crate) fn move_to_trash(&self, path: &Path) -> VaultResult<DeleteOutcome> {
        if !self.trash_dir.is_dir() {
            tracing::warn!(
                path = %path.display(),
                "No trash directory, deleting permanently"
            );
            return self.delete_permanently(path);
        }

        let name = base_name(path);
        let now = now_epoch();
        for offset in 0..MAX_TRASH_NAME_ATTEMPTS {
            let dest = self.trash_dir.join(TrashName::format(now + offset, &name));
            match atomic::move_no_clobber(path, &dest) {
                Ok(()) => {
                    tracing::info!(from = %path.display(), to = %dest.display(), "Moved to trash");
                    return Ok(DeleteOutcome::Trashed {
                        name,
                        trash_path: self.resolver.to_relative(&dest),
                    });
                }
                Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {}
                Err(e) => {
                    tracing::warn!(
                        path = %path.display(),
                        error = %e,
                        "Move to trash failed, deleting permanently"
                    );
                    return self.delete_permanently(path);
                }
            }
        }

        tracing::warn!(
            path = %path.display(),
            "No free trash name, deleting permanently"
        );
        self.delete_permanently(path)
    }

    /// List trashed entries, newest first.
    pub fn trash_list(&self) -> VaultResult<Vec<TrashEntry>> {
        if !self.trash_dir.is_dir() {
            return Ok(Vec::new());
        }

        let read_dir = fs::read_dir(&self.trash_dir)
            .map_err(|e| VaultError::io(Operation::TrashList, &self.trash_dir, e))?;
        let mut entries = Vec::new();
        for item in read_dir {
            let item = match item {
                Ok(item) => item,
                Err(e) => {
                    tracing::warn!(error = %e, "Skipping unreadable trash entry");
                    continue;
                }
            };
            let trash_name = item.file_name().to_string_lossy().into_owned();
            let kind = match item.file_type() {
                Ok(t) if t.is_dir() => EntryKind::Directory,
                Ok(_) => EntryKind::File,
                Err(e) => {
                    tracing::warn!(name = %trash_name, error = %e, "Skipping trash entry without type");
                    continue;
                }
            };
            let parsed = TrashName::parse(&trash_name);
            entries.push(TrashEntry {
                name: parsed.original_name,
                path: format!("/{TRASH_DIR_NAME}/{trash_name}"),
                trash_name,
                kind,
                deleted_at: parsed.deleted_at,
                deleted_date: format_timestamp(parsed.deleted_at),
            });
        }

        entries.sort_by(|a, b| b.deleted_at.cmp(&a.deleted_at));
        Ok(entries)
    }

    /// Move a trashed entry back to the root under its original name.
    ///
    /// If that name is taken, `{stem}_restored_{n}{ext}` is used with the
    /// smallest free `n`.
    pub fn restore(&self, trash_name: &str) -> VaultResult<Restored> {
        let source = self.trash_entry(trash_name)?;

        let parsed = TrashName::parse(trash_name);
        let original = if validate_name(&parsed.original_name, Subject::TrashEntry).is_ok() {
            parsed.original_name
        } else {
            trash_name.to_string()
        };

        let (stem, ext) = split_extension(&original);
        for n in 0..=MAX_RESTORE_ATTEMPTS {
            let candidate = if n == 0 {
                original.clone()
            } else {
                format!("{stem}_restored_{n}{ext}")
            };
            let dest = self.resolver.root().join(&candidate);
            if atomic::occupied(&dest) {
                continue;
            }
            match atomic::move_no_clobber(&source, &dest) {
                Ok(()) => {
                    tracing::info!(from = %source.display(), to = %dest.display(), "Restored from trash");
                    return Ok(Restored {
                        name: candidate,
                        path: self.resolver.to_relative(&dest),
                    });
                }
                Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                    tracing::debug!(dest = %dest.display(), "Restore target taken, trying next name");
                }
                Err(e) => return Err(VaultError::io(Operation::Restore, &source, e)),
            }
        }

        Err(VaultError::already_exists(format!("/{original}"), Subject::TrashEntry))
    }

    /// Permanently remove one trashed entry.
    pub fn purge(&self, trash_name: &str) -> VaultResult<Purged> {
        let source = self.trash_entry(trash_name)?;
        self.remove_permanently(&source, Operation::Purge)?;
        Ok(Purged {
            name: trash_name.to_string(),
        })
    }

    /// Permanently remove everything in the trash, keeping the directory.
    ///
    /// Every entry is attempted even if an earlier one fails.
    pub fn empty_trash(&self) -> VaultResult<EmptyTrashOutcome> {
        if !self.trash_dir.is_dir() {
            return Ok(EmptyTrashOutcome {
                existed: false,
                removed: 0,
            });
        }

        let read_dir = fs::read_dir(&self.trash_dir)
            .map_err(|e| VaultError::io(Operation::EmptyTrash, &self.trash_dir, e))?;
        let mut removed = 0;
        let mut failed = 0;
        for item in read_dir {
            let child = match item {
                Ok(item) => item.path(),
                Err(e) => {
                    tracing::warn!(error = %e, "Unreadable trash entry");
                    failed += 1;
                    continue;
                }
            };
            match self.remove_permanently(&child, Operation::EmptyTrash) {
                Ok(_) => removed += 1,
                Err(_) => failed += 1,
            }
        }

        if failed > 0 {
            return Err(VaultError::io(
                Operation::EmptyTrash,
                &self.trash_dir,
                io::Error::other(format!("{failed} trash entries could not be removed")),
            ));
        }
        tracing::info!(removed, "Emptied trash");
        Ok(EmptyTrashOutcome {
            existed: true,
            removed,
        })
    }

    /// Absolute path of an existing trash entry named `trash_name`.
    fn trash_entry(&self, trash_name: &str) -> VaultResult<PathBuf> {
        validate_name(trash_name, Subject::TrashEntry)?;
        let source = self.trash_dir.join(trash_name);
        if !atomic::occupied(&source) {
            return Err(VaultError::not_found(trash_name, Subject::TrashEntry));
        }
        Ok(source)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::VaultConfig;
    use tempfile::TempDir;

    fn vault_with_trash() -> (TempDir, FileVault) {
        let temp = TempDir::new().unwrap();
        let vault = FileVault::open(&VaultConfig::new(temp.path())).unwrap();
        assert!(vault.ensure_trash().unwrap());
        (temp, vault)
    }

    #[test]
    fn test_ensure_trash_is_idempotent() {
        let (_temp, vault) = vault_with_trash();
        assert!(!vault.ensure_trash().unwrap());
        assert!(vault.trash_dir().is_dir());
    }

    #[test]
    fn test_same_second_deletes_get_distinct_names() {
        let (temp, vault) = vault_with_trash();
        fs::write(temp.path().join("a.txt"), b"first").unwrap();
        let first = vault.delete("/a.txt", false).unwrap();
        fs::write(temp.path().join("a.txt"), b"second").unwrap();
        let second = vault.delete("/a.txt", false).unwrap();

        let (DeleteOutcome::Trashed { trash_path: p1, .. }, DeleteOutcome::Trashed { trash_path: p2, .. }) =
            (first, second)
        else {
            panic!("expected both deletes to be recoverable");
        };
        assert_ne!(p1, p2);
        assert_eq!(vault.trash_list().unwrap().len(), 2);
    }

    #[test]
    fn test_delete_inside_trash_is_permanent() {
        let (temp, vault) = vault_with_trash();
        fs::write(temp.path().join(".trash/5_old.txt"), b"x").unwrap();

        let outcome = vault.delete("/.trash/5_old.txt", false).unwrap();
        assert!(matches!(outcome, DeleteOutcome::Removed { .. }));
        assert!(vault.trash_list().unwrap().is_empty());
    }

    #[test]
    fn test_restore_rejects_bad_names() {
        let (_temp, vault) = vault_with_trash();
        for name in ["", ".", "..", "../etc", "a/b"] {
            assert!(
                matches!(vault.restore(name), Err(VaultError::InvalidName { .. })),
                "name {name:?}"
            );
        }
        assert!(matches!(
            vault.restore("1_missing.txt"),
            Err(VaultError::NotFound { subject: Subject::TrashEntry, .. })
        ));
    }

    #[test]
    fn test_restore_keeps_dotfile_whole() {
        let (temp, vault) = vault_with_trash();
        fs::write(temp.path().join(".bashrc"), b"live").unwrap();
        fs::write(temp.path().join(".trash/9_.bashrc"), b"trashed").unwrap();

        let restored = vault.restore("9_.bashrc").unwrap();
        assert_eq!(restored.name, ".bashrc_restored_1");
        assert_eq!(restored.path, "/.bashrc_restored_1");
    }

    #[test]
    fn test_restore_without_underscore_uses_stored_name() {
        let (temp, vault) = vault_with_trash();
        fs::write(temp.path().join(".trash/orphan.txt"), b"x").unwrap();

        let restored = vault.restore("orphan.txt").unwrap();
        assert_eq!(restored.name, "orphan.txt");
        assert!(temp.path().join("orphan.txt").exists());
    }

    #[test]
    fn test_restore_of_invalid_original_name_uses_stored_name() {
        let (temp, vault) = vault_with_trash();
        fs::write(temp.path().join(".trash/7_.."), b"x").unwrap();

        let restored = vault.restore("7_..").unwrap();
        assert_eq!(restored.name, "7_..");
    }

    #[test]
    fn test_purge_directory() {
        let (temp, vault) = vault_with_trash();
        fs::create_dir_all(temp.path().join(".trash/3_proj/src")).unwrap();
        fs::write(temp.path().join(".trash/3_proj/src/lib.rs"), b"").unwrap();

        let purged = vault.purge("3_proj").unwrap();
        assert_eq!(purged.name, "3_proj");
        assert!(!temp.path().join(".trash/3_proj").exists());
        assert!(vault.trash_dir().is_dir());
    }

    #[test]
    fn test_trash_list_without_trash_dir() {
        let temp = TempDir::new().unwrap();
        let vault = FileVault::open(&VaultConfig::new(temp.path())).unwrap();
        assert!(vault.trash_list().unwrap().is_empty());
        assert_eq!(
            vault.empty_trash().unwrap(),
            EmptyTrashOutcome {
                existed: false,
                removed: 0
            }
        );
    }
}
