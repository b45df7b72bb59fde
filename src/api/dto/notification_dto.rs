//! Push request DTOs for notifications and system messages.

use serde::Deserialize;
use utoipa::ToSchema;

use crate::domain::{Notification, NotificationAction, SystemLevel, UserId};

/// Request body for `POST /notifications`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct NotifyRequest {
    /// Notification to push. Its `user_id` selects the recipient.
    pub notification: Notification,
    /// What happened to the notification.
    pub action: NotificationAction,
}

/// Request body for `POST /notifications/read`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct NotificationReadRequest {
    /// Owner of the notifications.
    pub user_id: UserId,
    /// Notifications marked as read.
    pub notification_ids: Vec<uuid::Uuid>,
}

/// Request body for `POST /system-messages`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct SystemMessageRequest {
    /// Text to display.
    pub message: String,
    /// Severity. Defaults to `info`.
    #[serde(default)]
    pub level: SystemLevel,
    /// Recipient. Omit to broadcast.
    #[serde(default)]
    pub user_id: Option<UserId>,
}
