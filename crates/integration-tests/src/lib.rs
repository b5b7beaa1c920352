//! Integration tests for the marketplace components.
//!
//! Servers are started in-process on an ephemeral port and driven over real
//! HTTP, so no external services are needed:
//!
//! ```bash
//! cargo test -p marketplace-integration-tests
//! ```
//!
//! # Test Categories
//!
//! - `server` - Static server routes, fallbacks and error rendering
//! - `shell_session` - Session startup, navbar and authorized requests
//! - `catalog_documents` - Validation of app documents as the CLI reads them

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::net::SocketAddr;
use std::path::Path;

use axum::Router;
use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use marketplace_server::config::ServerConfig;
use marketplace_server::state::AppState;
use serde_json::Value;
use tokio::task::JoinHandle;

/// A server running on a local ephemeral port.
pub struct TestServer {
    pub addr: SocketAddr,
    handle: JoinHandle<()>,
}

impl TestServer {
    /// Serve `router` until the value is dropped.
    ///
    /// # Errors
    ///
    /// Returns an error if no local port can be bound.
    pub async fn spawn(router: Router) -> std::io::Result<Self> {
        let listener = tokio::net::TcpListener::bind(("127.0.0.1", 0)).await?;
        let addr = listener.local_addr()?;
        let handle = tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, router).await {
                report_stopped(&e);
            }
        });
        Ok(Self { addr, handle })
    }

    /// Serve the marketplace server for `static_dir`.
    ///
    /// # Errors
    ///
    /// Returns an error if no local port can be bound.
    pub async fn marketplace(static_dir: &Path) -> std::io::Result<Self> {
        let config = ServerConfig {
            static_dir: static_dir.to_path_buf(),
            ..ServerConfig::default()
        };
        Self::spawn(marketplace_server::app(AppState::new(config))).await
    }

    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{path}", self.addr)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

#[allow(clippy::print_stderr)]
fn report_stopped(e: &std::io::Error) {
    eprintln!("test server stopped: {e}");
}

/// Build an unsigned bearer token around `claims`.
#[must_use]
pub fn make_token(claims: &Value) -> String {
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
    let body = URL_SAFE_NO_PAD.encode(claims.to_string());
    format!("{header}.{body}.signature")
}

/// A bundled app build: an index document and one asset.
///
/// # Errors
///
/// Returns an error if the temporary directory cannot be written.
pub fn bundled_app() -> std::io::Result<tempfile::TempDir> {
    let dir = tempfile::tempdir()?;
    std::fs::write(
        dir.path().join("index.html"),
        "<!doctype html><title>NotePad</title><div id=\"root\"></div>",
    )?;
    std::fs::create_dir(dir.path().join("assets"))?;
    std::fs::write(dir.path().join("assets/app.js"), "console.log('notepad');")?;
    Ok(dir)
}
