//! Serve command - run the HTTP API over a vault root.
//!
//! # Examples
//!
//! ```bash
//! # Serve the current directory on localhost:8080
//! browserpad serve
//!
//! # Public bind with a trash area and a restricted CORS origin
//! browserpad serve /srv/files --bind 0.0.0.0 --init-trash \
//!     --allow-origin https://pad.example.com
//! ```

use std::net::{IpAddr, Ipv4Addr};
use std::path::PathBuf;

use anyhow::{Context, Result};
use browserpad_core::{FileVault, VaultConfig};
use browserpad_server::{BrowserPadServer, ServerConfig};
use clap::Args as ClapArgs;
use tracing::info;

use crate::config::{self, FileConfig, CONFIG_ENV};

/// Port used when neither the flag nor the config file sets one.
pub const DEFAULT_PORT: u16 = 8080;

#[derive(ClapArgs, Clone, Default)]
pub struct Args {
    /// Directory to serve (default: current directory)
    #[arg(value_name = "ROOT")]
    pub root: Option<PathBuf>,

    /// Address to bind (default: 127.0.0.1)
    #[arg(long, value_name = "ADDR")]
    pub bind: Option<IpAddr>,

    /// Port to listen on (default: 8080, 0 picks a free port)
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Value for Access-Control-Allow-Origin (default: *)
    #[arg(long, value_name = "ORIGIN")]
    pub allow_origin: Option<String>,

    /// Separate root for the save endpoint
    #[arg(long, value_name = "DIR")]
    pub save_root: Option<PathBuf>,

    /// Create the trash directory if it is missing
    #[arg(long)]
    pub init_trash: bool,

    /// Config file to read instead of the default location
    #[arg(long, value_name = "FILE", env = CONFIG_ENV)]
    pub config: Option<PathBuf>,
}

/// Effective settings after merging flags over the config file.
#[derive(Debug)]
pub struct Settings {
    pub vault: VaultConfig,
    pub server: ServerConfig,
    pub init_trash: bool,
}

impl Settings {
    /// Flags win over the file, the file wins over defaults.
    pub fn merge(args: &Args, file: FileConfig) -> Self {
        let root = args
            .root
            .clone()
            .or(file.root)
            .unwrap_or_else(|| PathBuf::from("."));

        let mut vault = VaultConfig::new(root);
        if let Some(save_root) = args.save_root.clone().or(file.save.root) {
            vault = vault.with_save_root(save_root);
        }
        if let Some(extensions) = file.save.allowed_extensions {
            vault = vault.with_allowed_extensions(extensions);
        }

        let server = ServerConfig {
            port: args.port.or(file.port).unwrap_or(DEFAULT_PORT),
            bind_address: args
                .bind
                .or(file.bind)
                .unwrap_or(IpAddr::V4(Ipv4Addr::LOCALHOST)),
            allowed_origin: args
                .allow_origin
                .clone()
                .or(file.allow_origin)
                .unwrap_or_else(|| "*".to_string()),
            ..ServerConfig::default()
        };

        Self {
            vault,
            server,
            init_trash: args.init_trash || file.init_trash,
        }
    }
}

pub fn execute(args: &Args) -> Result<()> {
    let file = config::load(args.config.as_deref())?;
    let settings = Settings::merge(args, file);

    if !settings.vault.root.is_dir() {
        anyhow::bail!("Root is not a directory: {}", settings.vault.root.display());
    }
    let vault = FileVault::open(&settings.vault).context("Failed to open vault")?;
    if settings.init_trash && vault.ensure_trash().context("Failed to create trash directory")? {
        info!(path = %vault.trash_dir().display(), "Initialized trash");
    }

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to start async runtime")?;
    runtime.block_on(serve(vault, settings.server))
}

async fn serve(vault: FileVault, config: ServerConfig) -> Result<()> {
    let root = vault.root().to_path_buf();
    let server = BrowserPadServer::start(vault, config)
        .await
        .context("Failed to start server")?;

    println!("Serving {} at {}", root.display(), server.url());
    println!("Press Ctrl-C to stop");

    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for Ctrl-C")?;
    info!("Shutting down");
    server.stop().await;
    Ok(())
}
