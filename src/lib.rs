//! # realtime-hub
//!
//! In-process presence tracking and notification fan-out.
//!
//! The hub tracks which connections are open and which user owns each, and
//! routes pre-serialized messages to one connection, to every connection of
//! a user, or to everyone. A single coordinator task owns all registry
//! writes; slow receivers lose messages instead of stalling the sender.
//!
//! ## Architecture
//!
//! ```text
//! Clients (WebSocket)            Business layer (REST / in-process)
//!     │                                │
//!     ├── WS transport (ws/)           ├── Push handlers (api/)
//!     │                                ├── NotificationAdapter (service/)
//!     │                                │
//!     └──────────── Hub handle (service/) ────────────┘
//!                        │  bounded command queue
//!                        ▼
//!             Coordinator ── Registry (domain/)
//!                        │  non-blocking try_send
//!                        ▼
//!             per-connection Mailbox ──► socket
//! ```

pub mod api;
pub mod app_state;
pub mod config;
pub mod domain;
pub mod error;
pub mod service;
pub mod ws;

use axum::Router;
use axum::routing::get;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::app_state::AppState;

/// Builds the full application router: REST API, WebSocket endpoint, and
/// HTTP middleware.
pub fn build_app(state: AppState) -> Router {
    Router::new()
        .merge(api::build_router())
        .route("/ws", get(ws::handler::ws_handler))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
