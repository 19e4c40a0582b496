//! Optional TOML configuration file.
//!
//! Looked up in order: `--config FILE`, `$BROWSERPAD_CONFIG`, then
//! `config.toml` in the platform config directory
//! (`~/.config/browserpad/config.toml` on Linux). Only the first two are
//! required to exist.
//!
//! ```toml
//! root = "/srv/browserpad/files"
//! bind = "0.0.0.0"
//! port = 8080
//! allow_origin = "https://pad.example.com"
//! init_trash = true
//!
//! [save]
//! root = "/srv/browserpad/scripts"
//! allowed_extensions = [".sh", ".py"]
//! ```

use std::fs;
use std::net::IpAddr;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::Deserialize;

/// Environment variable naming an explicit config file.
pub const CONFIG_ENV: &str = "BROWSERPAD_CONFIG";

/// Settings read from the config file. Every field is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    pub root: Option<PathBuf>,
    pub bind: Option<IpAddr>,
    pub port: Option<u16>,
    pub allow_origin: Option<String>,
    #[serde(default)]
    pub init_trash: bool,
    #[serde(default)]
    pub save: SaveSection,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SaveSection {
    pub root: Option<PathBuf>,
    pub allowed_extensions: Option<Vec<String>>,
}

/// Default config file location for this platform.
pub fn default_path() -> Option<PathBuf> {
    ProjectDirs::from("", "", "browserpad").map(|dirs| dirs.config_dir().join("config.toml"))
}

/// Load the config file.
///
/// `explicit` is the `--config` flag, which clap already falls back to
/// `$BROWSERPAD_CONFIG` for.
pub fn load(explicit: Option<&Path>) -> Result<FileConfig> {
    if let Some(path) = explicit {
        return read(path);
    }

    match default_path() {
        Some(path) if path.is_file() => read(&path),
        _ => Ok(FileConfig::default()),
    }
}

fn read(path: &Path) -> Result<FileConfig> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;
    let config = toml::from_str(&text)
        .with_context(|| format!("Invalid config file: {}", path.display()))?;
    tracing::debug!(path = %path.display(), "Loaded config file");
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_config() {
        let config: FileConfig = toml::from_str(
            r#"
            root = "/srv/files"
            bind = "0.0.0.0"
            port = 9000
            allow_origin = "https://pad.example.com"
            init_trash = true

            [save]
            root = "/srv/scripts"
            allowed_extensions = ["sh", ".py"]
            "#,
        )
        .unwrap();

        assert_eq!(config.root.as_deref(), Some(Path::new("/srv/files")));
        assert_eq!(config.bind, Some(IpAddr::from([0, 0, 0, 0])));
        assert_eq!(config.port, Some(9000));
        assert_eq!(config.allow_origin.as_deref(), Some("https://pad.example.com"));
        assert!(config.init_trash);
        assert_eq!(config.save.root.as_deref(), Some(Path::new("/srv/scripts")));
        assert_eq!(
            config.save.allowed_extensions,
            Some(vec!["sh".to_string(), ".py".to_string()])
        );
    }

    #[test]
    fn test_empty_config_is_default() {
        let config: FileConfig = toml::from_str("").unwrap();
        assert!(config.root.is_none());
        assert!(config.port.is_none());
        assert!(!config.init_trash);
        assert!(config.save.allowed_extensions.is_none());
    }

    #[test]
    fn test_unknown_keys_rejected() {
        assert!(toml::from_str::<FileConfig>("prot = 80").is_err());
    }

    #[test]
    fn test_explicit_missing_file_is_an_error() {
        let dir = tempfile::TempDir::new().unwrap();
        let err = load(Some(&dir.path().join("nope.toml"))).unwrap_err();
        assert!(format!("{err:#}").contains("Failed to read config file"));
    }

    #[test]
    fn test_explicit_file_is_read() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "port = 1234\n").unwrap();
        assert_eq!(load(Some(&path)).unwrap().port, Some(1234));
    }
}
