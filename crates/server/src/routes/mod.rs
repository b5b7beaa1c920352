//! HTTP route handlers.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health          - Liveness check
//! GET  /api/status      - Server status (JSON)
//! *    /api/*           - Unknown API endpoint (JSON 404)
//! GET  /*               - Static files, falling back to the index document
//! ```

pub mod api;
pub mod static_files;

use axum::{Router, routing::get};

use crate::state::AppState;

/// Create the application routes.
pub fn routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .nest("/api", api::routes())
        .fallback_service(static_files::service(state.config()))
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running.
async fn health() -> &'static str {
    "ok"
}
