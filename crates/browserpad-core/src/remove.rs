//! Depth-first recursive removal.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

/// An item that could not be removed.
#[derive(Debug)]
pub struct RemovalFailure {
    pub path: PathBuf,
    pub error: io::Error,
}

/// Outcome of [`remove_tree`].
#[derive(Debug, Default)]
pub struct RemovalReport {
    /// Files and symlinks unlinked
    pub files_removed: usize,
    /// Directories removed, including the target itself
    pub dirs_removed: usize,
    pub failures: Vec<RemovalFailure>,
}

impl RemovalReport {
    /// Returns true if every item was removed.
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    fn fail(&mut self, path: PathBuf, error: io::Error) {
        tracing::warn!(path = %path.display(), error = %error, "Failed to remove item");
        self.failures.push(RemovalFailure { path, error });
    }
}

/// Remove `path` and everything beneath it.
///
/// Children are removed before their parent directory. Symlinks are
/// unlinked, never followed, including a symlink passed as `path`. Removal
/// is best effort: an item that cannot be removed is recorded in the report
/// and the walk continues.
pub fn remove_tree(path: &Path) -> RemovalReport {
    let mut report = RemovalReport::default();

    for item in WalkDir::new(path).contents_first(true).follow_root_links(false) {
        let entry = match item {
            Ok(entry) => entry,
            Err(e) => {
                let failed = e.path().map_or_else(|| path.to_path_buf(), Path::to_path_buf);
                report.fail(failed, e.into());
                continue;
            }
        };

        if entry.file_type().is_dir() {
            match fs::remove_dir(entry.path()) {
                Ok(()) => report.dirs_removed += 1,
                Err(e) => report.fail(entry.into_path(), e),
            }
        } else {
            match fs::remove_file(entry.path()) {
                Ok(()) => report.files_removed += 1,
                Err(e) => report.fail(entry.into_path(), e),
            }
        }
    }

    tracing::debug!(
        path = %path.display(),
        files = report.files_removed,
        dirs = report.dirs_removed,
        failures = report.failures.len(),
        "Removed tree"
    );
    report
}
