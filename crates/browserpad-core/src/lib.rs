//! Confined file vault backing the BrowserPad editor.
//!
//! All file operations go through a [`FileVault`], which owns one root
//! directory and refuses any path that would resolve outside of it.
//!
//! # Overview
//!
//! - [`PathResolver`] maps client-supplied relative paths to absolute paths
//!   under the root, rejecting `..` segments and anything whose canonical
//!   parent escapes the root.
//! - Directory operations: [`FileVault::list`], [`FileVault::read`],
//!   [`FileVault::write`], [`FileVault::create`], [`FileVault::mkdir`],
//!   [`FileVault::rename`], [`FileVault::delete`].
//! - Trash: soft-deleted entries are moved into `/.trash` under the name
//!   `{deletedAtEpochSeconds}_{originalName}` and can be listed, restored,
//!   purged, or emptied.
//! - [`FileVault::save`] is the stricter single-file save path with an
//!   extension allow-list and timestamped backups.
//!
//! # Example
//!
//! ```no_run
//! use browserpad_core::{FileVault, VaultConfig};
//!
//! let vault = FileVault::open(&VaultConfig::new("/srv/browserpad/files"))?;
//! vault.create("/", "notes.txt", b"hello")?;
//! assert_eq!(vault.read("/notes.txt")?.content, b"hello");
//! # Ok::<(), browserpad_core::VaultError>(())
//! ```

mod atomic;
pub mod config;
pub mod entry;
pub mod error;
mod ops;
pub mod path;
pub mod remove;
mod save;
mod trash;

pub use config::{SaveConfig, VaultConfig, DEFAULT_ALLOWED_EXTENSIONS, TRASH_DIR_NAME};
pub use entry::{Entry, EntryKind, TrashEntry, TrashName};
pub use error::{ErrorCategory, NameRejection, Operation, SaveRejection, Subject, VaultError, VaultResult};
pub use ops::{
    CreatedDir, DeleteOutcome, FileContent, FileVault, Renamed, WrittenFile,
};
pub use path::{validate_name, PathResolver, MAX_NAME_LEN};
pub use remove::{remove_tree, RemovalFailure, RemovalReport};
pub use save::SaveOutcome;
pub use trash::{EmptyTrashOutcome, Purged, Restored};
