//! Outbound message envelope and the payload shapes the hub knows about.
//!
//! An [`Envelope`] is built by the caller and never mutated. The hub stamps
//! the send time while serializing it into a [`Frame`], so the wire form is:
//!
//! ```json
//! { "type": "notification", "payload": { ... }, "timestamp": "<RFC3339>", "message_id": "..." }
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::connection::Frame;
use super::notification::{Notification, NotificationAction};
use super::UserId;

/// Event kind discriminator (`type` on the wire).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    /// A notification was created, updated or deleted.
    Notification,
    /// One or more notifications were marked as read.
    NotificationRead,
    /// A user's first connection was registered.
    UserOnline,
    /// A user's last connection was unregistered.
    UserOffline,
    /// Operator or system announcement.
    SystemMessage,
    /// Liveness probe.
    Ping,
    /// Liveness probe reply.
    Pong,
}

impl EventType {
    /// Returns the wire name of the event type.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Notification => "notification",
            Self::NotificationRead => "notification_read",
            Self::UserOnline => "user_online",
            Self::UserOffline => "user_offline",
            Self::SystemMessage => "system_message",
            Self::Ping => "ping",
            Self::Pong => "pong",
        }
    }
}

/// Payload of a `notification` event.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NotificationEvent {
    /// The notification as produced by the business layer.
    pub notification: Notification,
    /// What happened to it.
    pub action: NotificationAction,
}

/// Payload of a `notification_read` event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NotificationReadEvent {
    /// User whose notifications were read.
    pub user_id: UserId,
    /// Notifications now marked as read.
    pub notification_ids: Vec<uuid::Uuid>,
}

/// Payload of `user_online` / `user_offline` events.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PresenceEvent {
    /// User whose presence changed.
    pub user_id: UserId,
    /// Number of connections the user holds after the transition.
    pub connections: usize,
}

/// Severity of a system message.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum SystemLevel {
    /// Informational.
    #[default]
    Info,
    /// Something the user should notice.
    Warning,
    /// Something went wrong.
    Critical,
}

/// Payload of a `system_message` event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SystemMessage {
    /// Human-readable text.
    pub message: String,
    /// Severity.
    pub level: SystemLevel,
}

/// Event-specific data.
///
/// A closed set of known shapes; the variant must agree with the
/// envelope's [`EventType`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Payload {
    /// `notification` data.
    Notification(NotificationEvent),
    /// `notification_read` data.
    NotificationRead(NotificationReadEvent),
    /// `user_online` / `user_offline` data.
    Presence(PresenceEvent),
    /// `system_message` data.
    System(SystemMessage),
    /// No payload; serialized as `null`.
    Empty,
}

/// Immutable outbound message.
#[derive(Debug, Clone, PartialEq)]
pub struct Envelope {
    event_type: EventType,
    payload: Payload,
    message_id: Option<String>,
}

/// Borrowed wire form of an envelope with the hub-assigned timestamp.
#[derive(Serialize)]
struct WireEnvelope<'a> {
    #[serde(rename = "type")]
    event_type: EventType,
    payload: &'a Payload,
    timestamp: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    message_id: Option<&'a str>,
}

impl Envelope {
    /// Creates an envelope with no correlation id.
    #[must_use]
    pub const fn new(event_type: EventType, payload: Payload) -> Self {
        Self {
            event_type,
            payload,
            message_id: None,
        }
    }

    /// Returns a copy carrying the given correlation id.
    #[must_use]
    pub fn with_message_id(mut self, message_id: impl Into<String>) -> Self {
        self.message_id = Some(message_id.into());
        self
    }

    /// Builds a `notification` envelope.
    #[must_use]
    pub fn notification(notification: Notification, action: NotificationAction) -> Self {
        Self::new(
            EventType::Notification,
            Payload::Notification(NotificationEvent {
                notification,
                action,
            }),
        )
    }

    /// Builds a `notification_read` envelope.
    #[must_use]
    pub fn notification_read(user_id: UserId, notification_ids: Vec<uuid::Uuid>) -> Self {
        Self::new(
            EventType::NotificationRead,
            Payload::NotificationRead(NotificationReadEvent {
                user_id,
                notification_ids,
            }),
        )
    }

    /// Builds a `system_message` envelope.
    #[must_use]
    pub fn system(message: String, level: SystemLevel) -> Self {
        Self::new(
            EventType::SystemMessage,
            Payload::System(SystemMessage { message, level }),
        )
    }

    /// Builds a `user_online` or `user_offline` envelope.
    #[must_use]
    pub fn presence(online: bool, user_id: UserId, connections: usize) -> Self {
        let event_type = if online {
            EventType::UserOnline
        } else {
            EventType::UserOffline
        };
        Self::new(
            event_type,
            Payload::Presence(PresenceEvent {
                user_id,
                connections,
            }),
        )
    }

    /// Builds a `pong` reply.
    #[must_use]
    pub const fn pong() -> Self {
        Self::new(EventType::Pong, Payload::Empty)
    }

    /// Returns the event type.
    #[must_use]
    pub const fn event_type(&self) -> EventType {
        self.event_type
    }

    /// Returns the payload.
    #[must_use]
    pub const fn payload(&self) -> &Payload {
        &self.payload
    }

    /// Returns the caller-supplied correlation id, if any.
    #[must_use]
    pub fn message_id(&self) -> Option<&str> {
        self.message_id.as_deref()
    }

    /// Serializes the envelope to its wire form, stamped with `timestamp`.
    ///
    /// # Errors
    ///
    /// Returns the underlying [`serde_json::Error`] if the payload cannot be
    /// serialized.
    pub fn to_frame(&self, timestamp: DateTime<Utc>) -> Result<Frame, serde_json::Error> {
        let wire = WireEnvelope {
            event_type: self.event_type,
            payload: &self.payload,
            timestamp,
            message_id: self.message_id.as_deref(),
        };
        serde_json::to_vec(&wire).map(Frame::from)
    }
}
