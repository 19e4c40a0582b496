//! Listing types for live and trashed entries.

use std::fs::Metadata;
use std::time::{SystemTime, UNIX_EPOCH};

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

/// Kind of a listed entry. Serialized as `"file"` or `"dir"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntryKind {
    #[serde(rename = "file")]
    File,
    #[serde(rename = "dir")]
    Directory,
}

impl EntryKind {
    pub fn from_metadata(meta: &Metadata) -> Self {
        if meta.is_dir() {
            Self::Directory
        } else {
            Self::File
        }
    }

    pub fn is_dir(self) -> bool {
        self == Self::Directory
    }
}

/// A file or directory under the root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    pub name: String,
    /// Path from the root, always starting with `/`
    pub path: String,
    #[serde(rename = "type")]
    pub kind: EntryKind,
    /// Byte length; 0 for directories
    pub size: u64,
    /// Last modification, epoch seconds
    pub modified: u64,
}

impl Entry {
    pub fn from_metadata(name: impl Into<String>, path: impl Into<String>, meta: &Metadata) -> Self {
        let kind = EntryKind::from_metadata(meta);
        Self {
            name: name.into(),
            path: path.into(),
            kind,
            size: if kind.is_dir() { 0 } else { meta.len() },
            modified: modified_epoch(meta),
        }
    }
}

/// Stored name of a trashed entry: `{deletedAtEpochSeconds}_{originalName}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrashName {
    pub deleted_at: u64,
    pub original_name: String,
}

impl TrashName {
    /// Split a stored name on its first underscore.
    ///
    /// A name without an underscore keeps the whole name as the original
    /// name; a prefix that is not a decimal number yields epoch 0.
    pub fn parse(stored: &str) -> Self {
        match stored.split_once('_') {
            Some((epoch, original)) => Self {
                deleted_at: epoch.parse().unwrap_or(0),
                original_name: original.to_string(),
            },
            None => Self {
                deleted_at: 0,
                original_name: stored.to_string(),
            },
        }
    }

    /// Build the stored name for `original_name` deleted at `deleted_at`.
    pub fn format(deleted_at: u64, original_name: &str) -> String {
        format!("{deleted_at}_{original_name}")
    }
}

/// An entry in `/.trash`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrashEntry {
    /// Original name before deletion
    pub name: String,
    /// Name as stored in the trash directory
    pub trash_name: String,
    pub path: String,
    #[serde(rename = "type")]
    pub kind: EntryKind,
    pub deleted_at: u64,
    /// `deleted_at` as local `YYYY-MM-DD HH:MM:SS`
    pub deleted_date: String,
}

pub(crate) fn modified_epoch(meta: &Metadata) -> u64 {
    meta.modified().map(epoch_seconds).unwrap_or(0)
}

pub(crate) fn epoch_seconds(time: SystemTime) -> u64 {
    time.duration_since(UNIX_EPOCH).map(|d| d.as_secs()).unwrap_or(0)
}

pub(crate) fn now_epoch() -> u64 {
    epoch_seconds(SystemTime::now())
}

/// Format epoch seconds as local `YYYY-MM-DD HH:MM:SS`.
pub fn format_timestamp(epoch: u64) -> String {
    i64::try_from(epoch)
        .ok()
        .and_then(|secs| DateTime::from_timestamp(secs, 0))
        .map(|utc| utc.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_default()
}
