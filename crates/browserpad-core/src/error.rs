//! Error types for vault operations.
//!
//! Every filesystem call site returns a [`VaultError`]. Callers that need to
//! map errors onto a transport (HTTP status codes, exit codes) go through
//! [`ErrorCategory`] so the mapping lives in one place per transport.
//!
//! The `Display` output of [`VaultError`] carries full paths and is meant for
//! logs. [`VaultError::client_message`] is the text safe to hand back to a
//! client: it never contains absolute filesystem paths.

use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Semantic category of a [`VaultError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Malformed input, invalid name, or `..` in a path (HTTP 400)
    InvalidInput,
    /// Missing entry or wrong kind of entry (HTTP 404)
    NotFound,
    /// Destination already exists (HTTP 409)
    Conflict,
    /// Path outside the root, reserved path, or disallowed extension (HTTP 403)
    Forbidden,
    /// Underlying filesystem failure (HTTP 500)
    Internal,
}

impl ErrorCategory {
    /// Returns a human-readable name for this category.
    pub fn name(self) -> &'static str {
        match self {
            Self::InvalidInput => "InvalidInput",
            Self::NotFound => "NotFound",
            Self::Conflict => "Conflict",
            Self::Forbidden => "Forbidden",
            Self::Internal => "Internal",
        }
    }
}

/// The vault operation an error occurred in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Open,
    List,
    Read,
    Write,
    Create,
    Mkdir,
    Rename,
    Delete,
    TrashList,
    Restore,
    Purge,
    EmptyTrash,
    Save,
}

impl Operation {
    /// Client-facing message for a filesystem failure during this operation.
    pub fn failure_message(self) -> &'static str {
        match self {
            Self::Open => "Cannot open file root",
            Self::List => "Cannot read directory",
            Self::Read => "Cannot read file",
            Self::Write => "Cannot write file",
            Self::Create => "Cannot create file",
            Self::Mkdir => "Cannot create directory",
            Self::Rename => "Cannot rename file",
            Self::Delete => "Cannot delete file or directory",
            Self::TrashList => "Cannot read trash",
            Self::Restore => "Cannot restore file",
            Self::Purge => "Cannot delete file from trash",
            Self::EmptyTrash => "Cannot empty trash",
            Self::Save => "Could not write to file. Check server permissions.",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Open => "open",
            Self::List => "list",
            Self::Read => "read",
            Self::Write => "write",
            Self::Create => "create",
            Self::Mkdir => "mkdir",
            Self::Rename => "rename",
            Self::Delete => "delete",
            Self::TrashList => "trash_list",
            Self::Restore => "restore",
            Self::Purge => "purge",
            Self::EmptyTrash => "empty_trash",
            Self::Save => "save",
        };
        f.write_str(name)
    }
}

/// What kind of entry an error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Subject {
    File,
    Directory,
    /// A file or a directory
    Entry,
    /// An entry stored in the trash
    TrashEntry,
}

impl fmt::Display for Subject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::File => "file",
            Self::Directory => "directory",
            Self::Entry => "entry",
            Self::TrashEntry => "trash entry",
        })
    }
}

/// Why a single-segment name was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameRejection {
    Empty,
    TooLong(usize),
    Separator,
    /// `.` or `..`
    Reserved,
}

impl fmt::Display for NameRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => f.write_str("name is empty"),
            Self::TooLong(len) => write!(f, "name is {len} bytes long"),
            Self::Separator => f.write_str("name contains a path separator"),
            Self::Reserved => f.write_str("name is a relative directory reference"),
        }
    }
}

/// Why a save target was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveRejection {
    /// The path does not contain the save marker exactly once
    MissingMarker,
    /// The target is an existing directory
    IsDirectory,
}

#[derive(Debug, Error)]
pub enum VaultError {
    #[error("path '{path}' contains a parent directory segment")]
    Traversal { path: String },

    #[error("path '{path}' resolves outside the vault root")]
    OutsideRoot { path: String },

    #[error("cannot resolve parent directory of '{path}': {source}")]
    Unresolvable {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error("invalid {subject} name '{name}': {reason}")]
    InvalidName {
        name: String,
        subject: Subject,
        reason: NameRejection,
    },

    #[error("{subject} not found: '{path}'")]
    NotFound { path: String, subject: Subject },

    #[error("not a directory: '{path}'")]
    InvalidDirectory { path: String },

    #[error("{subject} already exists: '{path}'")]
    AlreadyExists { path: String, subject: Subject },

    #[error("'{path}' is reserved and cannot be used for {operation}")]
    Reserved { path: String, operation: Operation },

    #[error("save path '{path}' is outside the save root")]
    SaveAccessDenied { path: String },

    #[error("extension '{extension}' is not allowed for saving")]
    ExtensionNotAllowed {
        extension: String,
        allowed: Vec<String>,
    },

    #[error("invalid save target '{path}': {reason:?}")]
    InvalidSaveTarget { path: String, reason: SaveRejection },

    #[error("backup of {} failed: {source}", path.display())]
    BackupFailed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("{operation} failed for {}: {source}", path.display())]
    Io {
        operation: Operation,
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl VaultError {
    pub(crate) fn io(operation: Operation, path: impl AsRef<Path>, source: io::Error) -> Self {
        Self::Io {
            operation,
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    pub(crate) fn not_found(path: impl Into<String>, subject: Subject) -> Self {
        Self::NotFound {
            path: path.into(),
            subject,
        }
    }

    pub(crate) fn already_exists(path: impl Into<String>, subject: Subject) -> Self {
        Self::AlreadyExists {
            path: path.into(),
            subject,
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Traversal { .. }
            | Self::InvalidName { .. }
            | Self::InvalidDirectory { .. }
            | Self::InvalidSaveTarget { .. } => ErrorCategory::InvalidInput,
            Self::Unresolvable { .. } | Self::NotFound { .. } => ErrorCategory::NotFound,
            Self::AlreadyExists { .. } => ErrorCategory::Conflict,
            Self::OutsideRoot { .. }
            | Self::Reserved { .. }
            | Self::SaveAccessDenied { .. }
            | Self::ExtensionNotAllowed { .. } => ErrorCategory::Forbidden,
            Self::BackupFailed { .. } | Self::Io { .. } => ErrorCategory::Internal,
        }
    }

    /// Message safe to return to a client.
    pub fn client_message(&self) -> String {
        match self {
            Self::Traversal { .. } | Self::OutsideRoot { .. } => "Invalid path".to_string(),
            Self::Unresolvable { .. } => "Path not found".to_string(),
            Self::InvalidName { subject, .. } => match subject {
                Subject::File => "Invalid filename",
                Subject::Directory => "Invalid directory name",
                Subject::Entry => "Invalid new filename",
                Subject::TrashEntry => "Invalid trash entry name",
            }
            .to_string(),
            Self::NotFound { subject, .. } => match subject {
                Subject::File => "File not found",
                Subject::Directory => "Directory not found",
                Subject::Entry => "File or directory not found",
                Subject::TrashEntry => "File not found in trash",
            }
            .to_string(),
            Self::InvalidDirectory { .. } => "Invalid directory path".to_string(),
            Self::AlreadyExists { subject, .. } => match subject {
                Subject::File => "File already exists",
                Subject::Directory => "Directory already exists",
                Subject::Entry | Subject::TrashEntry => "A file with that name already exists",
            }
            .to_string(),
            Self::Reserved { .. } => "Operation not permitted on a reserved path".to_string(),
            Self::SaveAccessDenied { .. } => "Path traversal detected. Access denied.".to_string(),
            Self::ExtensionNotAllowed { allowed, .. } => {
                format!("File extension not allowed. Allowed: {}", allowed.join(", "))
            }
            Self::InvalidSaveTarget { reason, .. } => match reason {
                SaveRejection::MissingMarker => "Invalid file path format",
                SaveRejection::IsDirectory => "Target is a directory, not a file",
            }
            .to_string(),
            Self::BackupFailed { .. } => "Could not create backup before writing".to_string(),
            Self::Io { operation, .. } => operation.failure_message().to_string(),
        }
    }
}

/// Result type for vault operations.
pub type VaultResult<T> = Result<T, VaultError>;
