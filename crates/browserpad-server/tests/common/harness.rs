//! Test server harness for API integration tests.
//!
//! Provides a `TestServer` that runs the API over a temporary root directory,
//! along with request helpers that decode the JSON envelope.

use std::path::Path;
use std::time::Duration;

use browserpad_core::{FileVault, VaultConfig};
use browserpad_server::{BrowserPadServer, ServerConfig};
use reqwest::{Client, Method, Response, StatusCode};
use serde_json::Value;
use tempfile::TempDir;

/// Origin configured on test servers.
pub const TEST_ORIGIN: &str = "https://pad.example.com";

/// Test server with HTTP client and automatic cleanup.
pub struct TestServer {
    /// The running API server.
    server: BrowserPadServer,
    /// HTTP client for making requests.
    client: Client,
    /// Base URL for the server.
    pub base_url: String,
    /// Root directory served (cleaned up on drop).
    temp_dir: TempDir,
}

impl TestServer {
    /// Start a server over a fresh root with a trash directory.
    pub async fn with_trash() -> Self {
        Self::start(true).await
    }

    /// Start a server over a fresh root without a trash directory.
    pub async fn without_trash() -> Self {
        Self::start(false).await
    }

    async fn start(with_trash: bool) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let vault = FileVault::open(&VaultConfig::new(temp_dir.path()))
            .expect("Failed to open vault");
        if with_trash {
            vault.ensure_trash().expect("Failed to create trash");
        }

        let config = ServerConfig {
            allowed_origin: TEST_ORIGIN.to_string(),
            max_body_bytes: 64 * 1024,
            ..ServerConfig::default()
        };
        let server = BrowserPadServer::start(vault, config)
            .await
            .expect("Failed to start API server");
        let base_url = server.url();

        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .expect("Failed to create HTTP client");

        let test_server = Self {
            server,
            client,
            base_url,
            temp_dir,
        };
        test_server.wait_ready().await;
        test_server
    }

    /// Wait for the server to be ready to accept connections.
    async fn wait_ready(&self) {
        for _ in 0..50 {
            if let Ok(resp) = self.client.get(self.url("/api/files?action=list")).send().await
                && resp.status().is_success()
            {
                return;
            }
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
        panic!("Server did not become ready in time");
    }

    /// Root directory served by this server.
    pub fn root(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Address the server is bound to.
    pub fn addr(&self) -> std::net::SocketAddr {
        self.server.addr
    }

    /// Build a full URL from a path.
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    // ========== HTTP Convenience Methods ==========

    /// Send a raw request.
    pub async fn request(&self, method: Method, path: &str, body: Option<Vec<u8>>) -> Response {
        let mut req = self.client.request(method, self.url(path));
        if let Some(body) = body {
            req = req.header("Content-Type", "application/json").body(body);
        }
        req.send().await.expect("Request failed")
    }

    /// GET a files action with query parameters.
    pub async fn get_action(&self, action: &str, query: &[(&str, &str)]) -> (StatusCode, Value) {
        let resp = self
            .client
            .get(self.url("/api/files"))
            .query(&[("action", action)])
            .query(query)
            .send()
            .await
            .expect("GET request failed");
        decode(resp).await
    }

    /// POST a files action with the action named in the query string.
    pub async fn post_action(&self, action: &str, body: &Value) -> (StatusCode, Value) {
        let resp = self
            .client
            .post(self.url("/api/files"))
            .query(&[("action", action)])
            .json(body)
            .send()
            .await
            .expect("POST request failed");
        decode(resp).await
    }

    /// POST to an endpoint with a JSON body.
    pub async fn post_json(&self, path: &str, body: &Value) -> (StatusCode, Value) {
        let resp = self
            .client
            .post(self.url(path))
            .json(body)
            .send()
            .await
            .expect("POST request failed");
        decode(resp).await
    }

    /// POST to the save endpoint.
    pub async fn save(&self, file: &str, content: &str) -> (StatusCode, Value) {
        self.post_json("/api/save", &serde_json::json!({ "file": file, "content": content }))
            .await
    }
}

/// Decode a JSON envelope response.
pub async fn decode(resp: Response) -> (StatusCode, Value) {
    let status = resp.status();
    let body = resp.text().await.expect("Failed to read response body");
    let value = serde_json::from_str(&body)
        .unwrap_or_else(|e| panic!("Response is not JSON ({e}): status={status}, body={body:?}"));
    (status, value)
}
