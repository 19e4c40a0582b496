//! JSON HTTP API for the BrowserPad file vault.
//!
//! Serves two endpoints over a [`FileVault`](browserpad_core::FileVault):
//!
//! - `/api/files` (alias `/api/files.php`): directory operations and trash,
//!   selected by an `action` query parameter or JSON body field.
//! - `/api/save` (alias `/api/save.php`): the single-file save path.
//!
//! Every response is a JSON object with `success` and `message` plus
//! action-specific fields, and carries CORS headers.
//!
//! # Example
//!
//! ```no_run
//! use browserpad_core::{FileVault, VaultConfig};
//! use browserpad_server::{BrowserPadServer, ServerConfig};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let vault = FileVault::open(&VaultConfig::new("/srv/browserpad/files"))?;
//! let server = BrowserPadServer::start(vault, ServerConfig::default()).await?;
//! println!("Listening on {}", server.url());
//! tokio::signal::ctrl_c().await?;
//! server.stop().await;
//! # Ok(())
//! # }
//! ```
//!
//! # Security
//!
//! By default the server binds to localhost only. There is no
//! authentication; put it behind a reverse proxy before exposing it.

mod api;
mod error;
mod request;
mod response;
mod server;

pub use api::Action;
pub use error::{ApiError, ServerError};
pub use server::{BrowserPadServer, ServerConfig, DEFAULT_MAX_BODY_BYTES};
