//! Axum WebSocket upgrade handler.

use axum::extract::ws::WebSocketUpgrade;
use axum::extract::{Query, State};
use axum::response::IntoResponse;
use serde::Deserialize;

use super::connection::run_connection;
use crate::app_state::AppState;
use crate::domain::UserId;
use crate::error::HubError;

/// Query string of the upgrade request.
///
/// Authentication happens upstream; `user_id` is trusted as given.
#[derive(Debug, Deserialize)]
pub struct WsParams {
    /// Owner of the new connection.
    pub user_id: String,
}

/// `GET /ws?user_id=<id>` — Upgrade HTTP connection to WebSocket.
///
/// # Errors
///
/// Returns [`HubError::InvalidRequest`] if `user_id` is blank.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
    Query(params): Query<WsParams>,
) -> Result<impl IntoResponse, HubError> {
    let user_id = params.user_id.trim();
    if user_id.is_empty() {
        return Err(HubError::InvalidRequest(
            "user_id must not be empty".to_string(),
        ));
    }
    let user_id = UserId::from(user_id);
    let hub = state.hub.clone();

    Ok(ws.on_upgrade(move |socket| run_connection(socket, hub, user_id)))
}
