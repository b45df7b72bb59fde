//! Presence query handlers.
//!
//! All reads come from one snapshot per request, so totals and per-user
//! counts in a response always agree with each other.

use axum::extract::{Path, Query, State};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};

use crate::api::dto::{
    HubStatsResponse, OnlineUsersResponse, PaginationParams, UserPresenceResponse,
};
use crate::app_state::AppState;
use crate::domain::UserId;

/// `GET /presence` — List online users.
#[utoipa::path(
    get,
    path = "/api/v1/presence",
    tag = "Presence",
    summary = "List online users",
    description = "Returns a paginated, sorted list of users holding at least one live connection.",
    params(PaginationParams),
    responses(
        (status = 200, description = "Online users", body = OnlineUsersResponse),
    )
)]
pub async fn list_online_users(
    State(state): State<AppState>,
    Query(params): Query<PaginationParams>,
) -> impl IntoResponse {
    let snapshot = state.hub.presence_snapshot().await;
    let (data, pagination) = params.paginate(snapshot.online_users());

    Json(OnlineUsersResponse {
        data,
        total_connections: snapshot.total_connections(),
        pagination,
    })
}

/// `GET /presence/users/{user_id}` — Presence of one user.
#[utoipa::path(
    get,
    path = "/api/v1/presence/users/{user_id}",
    tag = "Presence",
    summary = "Get user presence",
    description = "Returns whether the user is online and how many connections they hold.",
    params(
        ("user_id" = String, Path, description = "User identifier"),
    ),
    responses(
        (status = 200, description = "User presence", body = UserPresenceResponse),
    )
)]
pub async fn get_user_presence(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> impl IntoResponse {
    let user_id = UserId::from(user_id);
    let snapshot = state.hub.presence_snapshot().await;

    Json(UserPresenceResponse {
        online: snapshot.is_online(&user_id),
        connections: snapshot.user_connections(&user_id),
        user_id,
    })
}

/// `GET /presence/stats` — Connection and delivery counters.
#[utoipa::path(
    get,
    path = "/api/v1/presence/stats",
    tag = "Presence",
    summary = "Hub statistics",
    description = "Returns connection totals and delivered/dropped message counters.",
    responses(
        (status = 200, description = "Hub statistics", body = HubStatsResponse),
    )
)]
pub async fn get_stats(State(state): State<AppState>) -> impl IntoResponse {
    let snapshot = state.hub.presence_snapshot().await;
    let stats = state.hub.stats();

    Json(HubStatsResponse {
        total_connections: snapshot.total_connections(),
        online_users: snapshot.online_user_count(),
        delivered_messages: stats.delivered,
        dropped_messages: stats.dropped,
    })
}

/// Presence routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/presence", get(list_online_users))
        .route("/presence/stats", get(get_stats))
        .route("/presence/users/{user_id}", get(get_user_presence))
}
