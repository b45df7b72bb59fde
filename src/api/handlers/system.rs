//! Liveness endpoint reporting the hub's current load.

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use chrono::Utc;
use serde::Serialize;
use utoipa::ToSchema;

use crate::app_state::AppState;

/// Health check response.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    /// Always `"healthy"` when the handler answers.
    status: String,
    /// Crate version.
    version: String,
    /// Server time, RFC 3339.
    timestamp: String,
    /// Live connections currently registered.
    connections: usize,
    /// Distinct users with at least one connection.
    online_users: usize,
}

/// `GET /health` — Liveness plus current connection load.
#[utoipa::path(
    get,
    path = "/health",
    tag = "System",
    summary = "Health check",
    description = "Reports liveness, version, and how many connections and users the hub holds.",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse),
    )
)]
pub async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    let snapshot = state.hub.presence_snapshot().await;
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: Utc::now().to_rfc3339(),
        connections: snapshot.total_connections(),
        online_users: snapshot.online_user_count(),
    })
}

/// Root-level routes, outside `/api/v1`.
pub fn routes() -> Router<AppState> {
    Router::new().route("/health", get(health_handler))
}
