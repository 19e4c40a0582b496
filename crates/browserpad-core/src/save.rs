//! Single-file save with an extension allow-list and backups.
//!
//! The save endpoint receives the editor's view of a file as a URL (or bare
//! path) containing a marker such as `/FILES/`. Everything after the marker
//! is the path under the save root.

use std::ffi::OsString;
use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};

use url::Url;

use crate::atomic;
use crate::config::VaultConfig;
use crate::entry::{format_timestamp, now_epoch};
use crate::error::{Operation, SaveRejection, VaultError, VaultResult};
use crate::ops::FileVault;
use crate::path::{base_name, file_extension, PathResolver};

/// How many later epochs to try when a backup name is already taken.
const MAX_BACKUP_NAME_ATTEMPTS: u64 = 16;

/// Resolved save settings held by a [`FileVault`].
#[derive(Debug)]
pub(crate) struct SaveSettings {
    pub(crate) resolver: PathResolver,
    marker: String,
    allowed_extensions: Vec<String>,
}

impl SaveSettings {
    pub(crate) fn new(config: &VaultConfig) -> VaultResult<Self> {
        let root = config.save_root();
        let resolver =
            PathResolver::new(root).map_err(|e| VaultError::io(Operation::Open, root, e))?;
        Ok(Self {
            resolver,
            marker: config.save.marker.clone(),
            allowed_extensions: config
                .save
                .allowed_extensions
                .iter()
                .map(|e| e.to_lowercase())
                .collect(),
        })
    }

    fn is_allowed(&self, extension: &str) -> bool {
        self.allowed_extensions.iter().any(|e| e == extension)
    }
}

/// Result of [`FileVault::save`].
#[derive(Debug, Clone)]
pub struct SaveOutcome {
    pub filename: String,
    /// Path under the save root
    pub path: String,
    pub size: u64,
    /// Local time of the save, `YYYY-MM-DD HH:MM:SS`
    pub timestamp: String,
    /// Path of the backup taken before overwriting, if any
    pub backup: Option<String>,
}

impl FileVault {
    /// Save `content` to the file named by `file`, creating it if needed.
    ///
    /// `file` is a URL or path containing the save marker exactly once. An
    /// existing target is first copied to `{path}.backup.{epochSeconds}`.
    pub fn save(&self, file: &str, content: &[u8]) -> VaultResult<SaveOutcome> {
        let settings = &self.save;
        let relative = marked_path(file, &settings.marker).ok_or_else(|| {
            VaultError::InvalidSaveTarget {
                path: file.to_string(),
                reason: SaveRejection::MissingMarker,
            }
        })?;

        let target = settings.resolver.resolve(&relative).map_err(|e| match e {
            VaultError::Traversal { path }
            | VaultError::OutsideRoot { path }
            | VaultError::Unresolvable { path, .. } => VaultError::SaveAccessDenied { path },
            other => other,
        })?;

        let filename = base_name(&target);
        let extension = file_extension(&filename)
            .map(|e| format!(".{}", e.to_lowercase()))
            .unwrap_or_default();
        if !settings.is_allowed(&extension) {
            return Err(VaultError::ExtensionNotAllowed {
                extension,
                allowed: settings.allowed_extensions.clone(),
            });
        }

        if target.is_dir() {
            return Err(VaultError::InvalidSaveTarget {
                path: relative,
                reason: SaveRejection::IsDirectory,
            });
        }

        let now = now_epoch();
        let backup = if target.is_file() {
            Some(write_backup(&target, now)?)
        } else {
            None
        };

        // Write through a symlink rather than replacing it.
        let write_target = if target.is_file() {
            target
                .canonicalize()
                .map_err(|e| VaultError::io(Operation::Save, &target, e))?
        } else {
            target.clone()
        };
        let meta = atomic::replace_contents(&write_target, content)
            .map_err(|e| VaultError::io(Operation::Save, &write_target, e))?;
        tracing::info!(
            path = %write_target.display(),
            size = meta.len(),
            backup = backup.is_some(),
            "Saved file"
        );

        Ok(SaveOutcome {
            filename,
            path: settings.resolver.to_relative(&target),
            size: meta.len(),
            timestamp: format_timestamp(now),
            backup: backup.map(|b| settings.resolver.to_relative(&b)),
        })
    }
}

/// Extract the path after `marker` from a URL or bare path.
///
/// Returns `None` unless the marker appears exactly once.
fn marked_path(file: &str, marker: &str) -> Option<String> {
    let path = match Url::parse(file) {
        Ok(url) => url.path().to_string(),
        Err(_) => file.to_string(),
    };
    let mut parts = path.split(marker);
    let _host_part = parts.next()?;
    let relative = parts.next()?;
    if parts.next().is_some() {
        return None;
    }
    Some(relative.to_string())
}

/// Copy `target` to a fresh `{target}.backup.{epoch}`.
///
/// Existing backups are never overwritten; a taken name moves on to the
/// next epoch.
fn write_backup(target: &Path, now: u64) -> VaultResult<PathBuf> {
    let failed = |path: PathBuf, source: io::Error| {
        tracing::error!(path = %target.display(), error = %source, "Backup before save failed");
        VaultError::BackupFailed { path, source }
    };

    for offset in 0..MAX_BACKUP_NAME_ATTEMPTS {
        let path = backup_path(target, now + offset);
        let mut dest = match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(dest) => dest,
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => continue,
            Err(e) => return Err(failed(path, e)),
        };

        let copied = File::open(target).and_then(|mut source| {
            io::copy(&mut source, &mut dest)?;
            dest.set_permissions(source.metadata()?.permissions())?;
            dest.sync_all()
        });
        if let Err(e) = copied {
            drop(dest);
            if let Err(cleanup) = fs::remove_file(&path) {
                tracing::warn!(path = %path.display(), error = %cleanup, "Failed to remove partial backup");
            }
            return Err(failed(path, e));
        }

        tracing::debug!(path = %path.display(), "Wrote backup");
        return Ok(path);
    }

    Err(failed(
        backup_path(target, now),
        io::Error::new(io::ErrorKind::AlreadyExists, "no free backup name"),
    ))
}

fn backup_path(target: &Path, epoch: u64) -> PathBuf {
    let mut name = OsString::from(target.as_os_str());
    name.push(format!(".backup.{epoch}"));
    PathBuf::from(name)
}
