//! Vault configuration.
//!
//! A [`VaultConfig`] is built once at startup and handed to
//! [`FileVault::open`](crate::FileVault::open); nothing in it changes while
//! the vault is in use.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Name of the reserved trash directory directly under the root.
pub const TRASH_DIR_NAME: &str = ".trash";

/// Marker that separates the host part of a save URL from the file path.
pub const DEFAULT_SAVE_MARKER: &str = "/FILES/";

/// Extensions accepted by the save endpoint.
pub const DEFAULT_ALLOWED_EXTENSIONS: &[&str] = &[
    ".sh", ".py", ".js", ".html", ".css", ".txt", ".md", ".json", ".xml", ".conf", ".ini",
    ".log", ".bash", ".c", ".cpp", ".h", ".hpp", ".java", ".rb", ".go", ".yml", ".yaml",
    ".sql", ".php", ".env", ".dockerfile",
];

/// Configuration for a [`FileVault`](crate::FileVault).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VaultConfig {
    /// Directory all operations are confined to
    pub root: PathBuf,

    /// Settings for the single-file save endpoint
    #[serde(default)]
    pub save: SaveConfig,
}

/// Settings for the single-file save endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaveConfig {
    /// Root for saved files (defaults to the vault root)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub root: Option<PathBuf>,

    /// Marker preceding the relative path in a save URL
    #[serde(default = "default_marker")]
    pub marker: String,

    /// Allowed extensions, each with a leading dot
    #[serde(default = "default_allowed_extensions")]
    pub allowed_extensions: Vec<String>,
}

fn default_marker() -> String {
    DEFAULT_SAVE_MARKER.to_string()
}

fn default_allowed_extensions() -> Vec<String> {
    DEFAULT_ALLOWED_EXTENSIONS.iter().map(|e| (*e).to_string()).collect()
}

impl Default for SaveConfig {
    fn default() -> Self {
        Self {
            root: None,
            marker: default_marker(),
            allowed_extensions: default_allowed_extensions(),
        }
    }
}

impl VaultConfig {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            save: SaveConfig::default(),
        }
    }

    /// Use a separate root for the save endpoint.
    pub fn with_save_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.save.root = Some(root.into());
        self
    }

    /// Replace the save endpoint's extension allow-list.
    ///
    /// Entries are normalized to lowercase with a single leading dot.
    pub fn with_allowed_extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.save.allowed_extensions = extensions
            .into_iter()
            .map(|e| format!(".{}", e.as_ref().trim_start_matches('.').to_lowercase()))
            .collect();
        self
    }

    /// Root used by the save endpoint.
    pub fn save_root(&self) -> &Path {
        self.save.root.as_deref().unwrap_or(&self.root)
    }
}
