//! Application-level notification shape carried by `notification` events.
//!
//! The hub does not persist or interpret notifications; it only needs the
//! optional target user to decide between a directed send and a broadcast.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::UserId;

/// A notification record as produced by the business layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Notification {
    /// Notification identifier (owned by the durable store).
    pub id: uuid::Uuid,
    /// Recipient. `None` means the notification is for everyone.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<UserId>,
    /// Free-form category (e.g. `"comment"`, `"order_shipped"`).
    #[serde(rename = "type")]
    pub kind: String,
    /// Short headline.
    pub title: String,
    /// Body text.
    pub message: String,
    /// Arbitrary structured data attached by the producer.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<Object>)]
    pub data: Option<serde_json::Value>,
    /// Read flag at the time the event was emitted.
    #[serde(default)]
    pub read: bool,
    /// Creation timestamp.
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
}

/// What happened to the notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum NotificationAction {
    /// A new notification was created.
    Created,
    /// An existing notification changed.
    Updated,
    /// A notification was deleted.
    Deleted,
}
