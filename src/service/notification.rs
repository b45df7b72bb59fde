//! Bridge between business-level notifications and the hub.
//!
//! [`NotificationAdapter`] is the only place that knows what a notification
//! is. It builds the envelope and picks the target: the notification's user
//! when one is set, everyone otherwise.

use crate::domain::{Envelope, Notification, NotificationAction, SystemLevel, UserId};
use crate::error::HubError;

use super::RealtimeService;

/// Translates application events into hub sends.
#[derive(Debug, Clone)]
pub struct NotificationAdapter<S> {
    service: S,
}

impl<S: RealtimeService> NotificationAdapter<S> {
    /// Wraps a real-time service.
    #[must_use]
    pub const fn new(service: S) -> Self {
        Self { service }
    }

    /// Returns the wrapped service.
    #[must_use]
    pub const fn service(&self) -> &S {
        &self.service
    }

    /// Pushes a `notification` event with payload `{notification, action}`
    /// to the notification's user, or to everyone if it has none.
    ///
    /// # Errors
    ///
    /// Propagates [`HubError`] from the underlying send.
    pub async fn notify_notification(
        &self,
        notification: Notification,
        action: NotificationAction,
    ) -> Result<(), HubError> {
        let target = notification.user_id.clone();
        let envelope = Envelope::notification(notification, action);
        match target {
            Some(user_id) => self.service.send_to_user(&user_id, &envelope).await,
            None => self.service.broadcast(&envelope).await,
        }
    }

    /// Tells every connection of `user_id` that the given notifications were
    /// marked as read, so other tabs and devices can update their badges.
    ///
    /// # Errors
    ///
    /// Propagates [`HubError`] from the underlying send.
    pub async fn notify_notification_read(
        &self,
        user_id: UserId,
        notification_ids: Vec<uuid::Uuid>,
    ) -> Result<(), HubError> {
        let envelope = Envelope::notification_read(user_id.clone(), notification_ids);
        self.service.send_to_user(&user_id, &envelope).await
    }

    /// Pushes a `system_message` to one user, or to everyone.
    ///
    /// # Errors
    ///
    /// Propagates [`HubError`] from the underlying send.
    pub async fn notify_system_message(
        &self,
        message: String,
        level: SystemLevel,
        user_id: Option<UserId>,
    ) -> Result<(), HubError> {
        let envelope = Envelope::system(message, level);
        match user_id {
            Some(user_id) => self.service.send_to_user(&user_id, &envelope).await,
            None => self.service.broadcast(&envelope).await,
        }
    }
}
