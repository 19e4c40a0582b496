//! Path resolution and name validation.
//!
//! [`PathResolver`] is the only way a client-supplied path becomes an
//! absolute filesystem path. It never creates or modifies anything; it only
//! reads metadata to canonicalize the parent directory of the target.
//!
//! # Rules
//!
//! - Empty input, `/`, or only slashes and `.` segments resolve to the root.
//! - Any `..` segment is rejected before the filesystem is touched.
//! - The parent of the target is canonicalized (the target itself may not
//!   exist yet) and must lie under the canonical root, compared component by
//!   component.
//! - If the target exists and is a symlink, its canonical target must also
//!   lie under the root.

use std::io;
use std::path::{Path, PathBuf};

use crate::error::{NameRejection, Subject, VaultError, VaultResult};

/// Maximum length of a single name, in bytes.
pub const MAX_NAME_LEN: usize = 255;

/// Resolves relative paths against a canonical root directory.
#[derive(Debug, Clone)]
pub struct PathResolver {
    root: PathBuf,
}

impl PathResolver {
    /// Create a resolver for `root`.
    ///
    /// The root is canonicalized once here and must be an existing directory.
    pub fn new(root: impl AsRef<Path>) -> io::Result<Self> {
        let root = root.as_ref().canonicalize()?;
        if !root.is_dir() {
            return Err(io::Error::new(
                io::ErrorKind::NotADirectory,
                format!("{} is not a directory", root.display()),
            ));
        }
        Ok(Self { root })
    }

    /// The canonical root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve a client-supplied path to an absolute path under the root.
    pub fn resolve(&self, relative: &str) -> VaultResult<PathBuf> {
        if has_parent_segment(relative) {
            return Err(VaultError::Traversal {
                path: relative.to_string(),
            });
        }

        let segments: Vec<&str> = relative
            .split('/')
            .filter(|s| !s.is_empty() && *s != ".")
            .collect();
        let Some((name, parents)) = segments.split_last() else {
            return Ok(self.root.clone());
        };

        let parent = parents.iter().fold(self.root.clone(), |acc, s| acc.join(s));
        let canonical_parent = parent
            .canonicalize()
            .map_err(|source| VaultError::Unresolvable {
                path: relative.to_string(),
                source,
            })?;
        if !canonical_parent.starts_with(&self.root) {
            return Err(VaultError::OutsideRoot {
                path: relative.to_string(),
            });
        }

        let target = canonical_parent.join(name);
        if let Ok(meta) = target.symlink_metadata()
            && meta.file_type().is_symlink()
            && let Ok(link_target) = target.canonicalize()
            && !link_target.starts_with(&self.root)
        {
            return Err(VaultError::OutsideRoot {
                path: relative.to_string(),
            });
        }

        Ok(target)
    }

    /// Map an absolute path under the root back to its client-facing form.
    ///
    /// The result uses forward slashes and always starts with `/`; the root
    /// itself maps to `/`.
    pub fn to_relative(&self, absolute: &Path) -> String {
        let stripped = absolute.strip_prefix(&self.root).unwrap_or(absolute);
        let parts: Vec<String> = stripped
            .components()
            .map(|c| c.as_os_str().to_string_lossy().into_owned())
            .collect();
        format!("/{}", parts.join("/"))
    }

    /// Returns true if `path` is the root directory.
    pub fn is_root(&self, path: &Path) -> bool {
        path == self.root
    }
}

/// Returns true if `path` contains a `..` segment.
///
/// Both `/` and `\` count as separators so a Windows-style traversal is
/// rejected too.
pub fn has_parent_segment(path: &str) -> bool {
    path.split(['/', '\\']).any(|segment| segment == "..")
}

/// Validate a single-segment name for a new file, directory, or rename target.
pub fn validate_name(name: &str, subject: Subject) -> VaultResult<()> {
    let rejection = if name.is_empty() {
        Some(NameRejection::Empty)
    } else if name.len() > MAX_NAME_LEN {
        Some(NameRejection::TooLong(name.len()))
    } else if name.contains(['/', '\\']) {
        Some(NameRejection::Separator)
    } else if name == "." || name == ".." {
        Some(NameRejection::Reserved)
    } else {
        None
    };

    match rejection {
        Some(reason) => Err(VaultError::InvalidName {
            name: name.to_string(),
            subject,
            reason,
        }),
        None => Ok(()),
    }
}

/// Extension of `name`: the text after its last `.`, if any.
///
/// A leading dot counts, so `.env` has the extension `env`.
pub fn file_extension(name: &str) -> Option<&str> {
    name.rfind('.').map(|idx| &name[idx + 1..])
}

/// Split `name` into a stem and an extension including its dot.
///
/// A dot at position 0 does not start an extension, so `.bashrc` has no
/// extension.
pub fn split_extension(name: &str) -> (&str, &str) {
    match name.rfind('.') {
        Some(idx) if idx > 0 => name.split_at(idx),
        _ => (name, ""),
    }
}

/// Base name of `path` as a string.
pub(crate) fn base_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}
