//! Check-path command - show where a client path resolves under a root.
//!
//! # Examples
//!
//! ```bash
//! browserpad check-path /srv/files /docs/readme.md
//! browserpad check-path /srv/files ../etc/passwd   # rejected
//! ```

use std::path::PathBuf;

use anyhow::{bail, Result};
use browserpad_core::PathResolver;
use clap::Args as ClapArgs;

#[derive(ClapArgs, Clone)]
pub struct Args {
    /// Vault root directory
    #[arg(value_name = "ROOT")]
    pub root: PathBuf,

    /// Client path, relative to the root
    #[arg(value_name = "PATH")]
    pub path: String,
}

pub fn execute(args: &Args) -> Result<()> {
    if !args.root.is_dir() {
        bail!("Root is not a directory: {}", args.root.display());
    }
    let resolver = PathResolver::new(&args.root)?;
    let resolved = resolver.resolve(&args.path)?;

    let state = match resolved.symlink_metadata() {
        Ok(meta) if meta.is_dir() => "directory",
        Ok(meta) if meta.file_type().is_symlink() => "symlink",
        Ok(_) => "file",
        Err(_) => "absent",
    };
    println!("{}\t{state}", resolved.display());
    Ok(())
}
