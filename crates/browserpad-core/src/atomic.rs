//! Filesystem primitives that never clobber or tear.

use std::fs::{self, Metadata, OpenOptions};
use std::io::{self, Write};
use std::path::Path;

use fs2::FileExt;
use tempfile::NamedTempFile;

/// Permission bits for directories created by the vault.
#[cfg(unix)]
const DIR_MODE: u32 = 0o755;

/// Permission bits for files created through an atomic replace.
#[cfg(unix)]
const NEW_FILE_MODE: u32 = 0o644;

/// Returns true if anything (including a dangling symlink) exists at `path`.
pub(crate) fn occupied(path: &Path) -> bool {
    path.symlink_metadata().is_ok()
}

/// Create a single directory with mode 0755. Fails if `path` exists.
pub(crate) fn create_dir(path: &Path) -> io::Result<()> {
    let mut builder = fs::DirBuilder::new();
    #[cfg(unix)]
    {
        use std::os::unix::fs::DirBuilderExt;
        builder.mode(DIR_MODE);
    }
    builder.create(path)
}

/// Replace the contents of `path` with `content`.
///
/// An exclusive advisory lock on the current file serializes concurrent
/// writers; the new bytes go to a temp file in the same directory which is
/// then renamed over the target, so readers see either the old or the new
/// content. Existing permissions are carried over. Creates the file if it
/// does not exist.
pub(crate) fn replace_contents(path: &Path, content: &[u8]) -> io::Result<Metadata> {
    let parent = path
        .parent()
        .ok_or_else(|| io::Error::other("target has no parent directory"))?;

    let current = match OpenOptions::new().read(true).open(path) {
        Ok(file) => {
            file.lock_exclusive()?;
            Some(file)
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => None,
        Err(e) => return Err(e),
    };

    let mut temp = NamedTempFile::new_in(parent)?;
    temp.write_all(content)?;
    temp.as_file().sync_all()?;

    match &current {
        Some(file) => temp.as_file().set_permissions(file.metadata()?.permissions())?,
        #[cfg(unix)]
        None => {
            use std::os::unix::fs::PermissionsExt;
            temp.as_file()
                .set_permissions(fs::Permissions::from_mode(NEW_FILE_MODE))?;
        }
        #[cfg(not(unix))]
        None => {}
    }

    temp.persist(path).map_err(|e| e.error)?;
    // Lock is released when `current` drops.
    drop(current);
    fs::metadata(path)
}

/// Move `source` to `dest`, failing with `AlreadyExists` instead of
/// replacing whatever is at `dest`.
///
/// On Linux this is a single `renameat2(RENAME_NOREPLACE)`. Where that is
/// unavailable, regular files are moved with a hard link plus unlink, which
/// also refuses an existing destination atomically. Directories and
/// symlinks then fall back to an existence check followed by a rename.
pub(crate) fn move_no_clobber(source: &Path, dest: &Path) -> io::Result<()> {
    #[cfg(target_os = "linux")]
    {
        match rename_noreplace(source, dest) {
            Ok(()) => return Ok(()),
            Err(e) if matches!(e.raw_os_error(), Some(libc::EINVAL | libc::ENOSYS | libc::EOPNOTSUPP)) => {
                tracing::debug!(error = %e, "RENAME_NOREPLACE unsupported, falling back");
            }
            Err(e) => return Err(e),
        }
    }

    let meta = source.symlink_metadata()?;
    if meta.is_file() {
        match fs::hard_link(source, dest) {
            Ok(()) => {
                if let Err(e) = fs::remove_file(source) {
                    // Roll back so the entry is not present twice.
                    if let Err(rollback) = fs::remove_file(dest) {
                        tracing::error!(
                            dest = %dest.display(),
                            error = %rollback,
                            "Failed to roll back hard link after unlink failure"
                        );
                    }
                    return Err(e);
                }
                return Ok(());
            }
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => return Err(e),
            Err(e) => {
                tracing::debug!(error = %e, "Hard link unavailable, falling back to rename");
            }
        }
    }

    if occupied(dest) {
        return Err(already_exists(dest));
    }
    fs::rename(source, dest).map_err(|e| match e.kind() {
        // Lost a race: something appeared at `dest` after the check.
        io::ErrorKind::DirectoryNotEmpty
        | io::ErrorKind::IsADirectory
        | io::ErrorKind::NotADirectory => already_exists(dest),
        _ => e,
    })
}

fn already_exists(dest: &Path) -> io::Error {
    io::Error::new(
        io::ErrorKind::AlreadyExists,
        format!("{} already exists", dest.display()),
    )
}

/// `renameat2` with `RENAME_NOREPLACE`; `EEXIST` surfaces as `AlreadyExists`.
#[cfg(target_os = "linux")]
#[allow(unsafe_code)]
fn rename_noreplace(source: &Path, dest: &Path) -> io::Result<()> {
    use std::ffi::CString;
    use std::os::unix::ffi::OsStrExt;

    let source = CString::new(source.as_os_str().as_bytes())
        .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "invalid path"))?;
    let dest = CString::new(dest.as_os_str().as_bytes())
        .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "invalid path"))?;

    // SAFETY: both pointers come from live, NUL-terminated CStrings and the
    // paths are absolute, so AT_FDCWD is never consulted.
    let result = unsafe {
        libc::renameat2(
            libc::AT_FDCWD,
            source.as_ptr(),
            libc::AT_FDCWD,
            dest.as_ptr(),
            libc::RENAME_NOREPLACE,
        )
    };

    if result == 0 {
        Ok(())
    } else {
        Err(io::Error::last_os_error())
    }
}
