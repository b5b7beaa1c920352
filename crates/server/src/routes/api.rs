//! JSON API.

use axum::{Json, Router, extract::State, routing::get};
use chrono::{SecondsFormat, Utc};
use serde::Serialize;

use crate::error::{AppError, Result};
use crate::state::AppState;

/// Body of `GET /api/status`.
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub status: &'static str,
    pub message: &'static str,
    /// RFC 3339, UTC.
    pub timestamp: String,
    pub uptime_seconds: i64,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/status", get(status))
        .fallback(not_found)
}

#[tracing::instrument(skip_all)]
async fn status(State(state): State<AppState>) -> Json<StatusResponse> {
    let now = Utc::now();
    Json(StatusResponse {
        status: "ok",
        message: "Marketplace server is running",
        timestamp: now.to_rfc3339_opts(SecondsFormat::Millis, true),
        uptime_seconds: (now - state.started_at()).num_seconds(),
    })
}

async fn not_found() -> Result<()> {
    Err(AppError::NotFound("API endpoint not found".to_string()))
}
