//! Presence query DTOs.

use serde::Serialize;
use utoipa::ToSchema;

use super::common_dto::PaginationMeta;
use crate::domain::UserId;

/// Paginated response for `GET /presence`.
#[derive(Debug, Serialize, ToSchema)]
pub struct OnlineUsersResponse {
    /// Online users on this page, sorted.
    pub data: Vec<UserId>,
    /// Connections across all users at snapshot time.
    pub total_connections: usize,
    /// Pagination metadata over the full online set.
    pub pagination: PaginationMeta,
}

/// Response for `GET /presence/users/{user_id}`.
#[derive(Debug, Serialize, ToSchema)]
pub struct UserPresenceResponse {
    /// Queried user.
    pub user_id: UserId,
    /// Whether the user holds at least one connection.
    pub online: bool,
    /// Number of connections the user holds.
    pub connections: usize,
}

/// Response for `GET /presence/stats`.
#[derive(Debug, Serialize, ToSchema)]
pub struct HubStatsResponse {
    /// Registered connections.
    pub total_connections: usize,
    /// Distinct online users.
    pub online_users: usize,
    /// Frames enqueued since startup.
    pub delivered_messages: u64,
    /// Frames dropped on full or closed mailboxes since startup.
    pub dropped_messages: u64,
}
