//! REST API endpoints.
//!
//! All endpoints return JSON and require no authentication:
//!
//! - `GET /api/health`          - service status descriptor
//! - `GET /api/servers`         - fleet descriptors with current numbers
//! - `GET /api/metrics/history` - 24 hourly samples
//! - `GET /api/stats`           - aggregate counters
//! - `GET /api/export`          - metrics history as a CSV/JSON download

use axum::{
    Json, Router,
    extract::{Query, State},
    http::{StatusCode, header},
    response::IntoResponse,
    routing::get,
};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;

use crate::export::{ColumnSpec, ExportFormat, default_filename, export_rows};
use crate::mock;
use crate::state::AppState;

/// API error type
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let (status, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}

/// GET /api/health - liveness descriptor
///
/// Always returns 200 OK while the process is alive.
async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "service": "pulsemon-server",
        "version": env!("CARGO_PKG_VERSION"),
        "uptimeSecs": state.uptime_secs(),
    }))
}

/// GET /api/servers - fleet with freshly sampled resource numbers
async fn servers(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(mock::sample_fleet(&state.fleet))
}

/// GET /api/metrics/history - 24 hourly samples, oldest first
async fn metrics_history() -> impl IntoResponse {
    Json(mock::history(24))
}

/// GET /api/stats - aggregate counters
async fn stats(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.stats.snapshot(state.uptime_secs()))
}

#[derive(Debug, Deserialize)]
struct ExportQuery {
    format: String,
    hours: Option<u32>,
}

/// Columns of the exported metrics-history table.
fn history_columns() -> Vec<ColumnSpec> {
    fn one_decimal(value: &serde_json::Value) -> String {
        format!("{:.1}", value.as_f64().unwrap_or_default())
    }

    vec![
        ColumnSpec::new("time", "Time"),
        ColumnSpec::new("cpu", "CPU %").with_format(one_decimal),
        ColumnSpec::new("memory", "Memory %").with_format(one_decimal),
        ColumnSpec::new("networkIn", "Network In").with_format(one_decimal),
        ColumnSpec::new("networkOut", "Network Out").with_format(one_decimal),
    ]
}

/// GET /api/export?format=csv|json&hours=N - metrics history download
async fn export(
    Query(query): Query<ExportQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let format = ExportFormat::parse(&query.format)
        .ok_or_else(|| ApiError::BadRequest(format!("unsupported export format: {}", query.format)))?;
    let hours = query.hours.unwrap_or(24).clamp(1, 168);

    let rows: Vec<serde_json::Value> = mock::history(hours)
        .iter()
        .map(serde_json::to_value)
        .collect::<Result<_, _>>()
        .map_err(|e| ApiError::Internal(e.to_string()))?;

    let body = export_rows(&rows, &history_columns(), format)
        .map_err(|e| ApiError::Internal(e.to_string()))?;
    let filename = default_filename("metrics", format);

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, format.content_type().to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{filename}\""),
            ),
        ],
        body,
    ))
}

/// Build the API router sub-tree mounted under `/api`.
pub fn create_api_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/servers", get(servers))
        .route("/metrics/history", get(metrics_history))
        .route("/stats", get(stats))
        .route("/export", get(export))
        .with_state(state)
}
