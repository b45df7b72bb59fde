//! Domain layer: identifiers, connection records, envelopes, and the
//! connection registry.
//!
//! Nothing here spawns tasks or takes locks. The coordinator in
//! [`crate::service`] owns a [`Registry`] and drives it; transports only
//! ever see a [`Connection`] / [`Mailbox`] pair.

pub mod connection;
pub mod connection_id;
pub mod envelope;
pub mod notification;
pub mod registry;
pub mod user_id;

pub use connection::{Connection, DeliveryOutcome, Frame, Mailbox};
pub use connection_id::ConnectionId;
pub use envelope::{Envelope, EventType, Payload, SystemLevel};
pub use notification::{Notification, NotificationAction};
pub use registry::{PresenceSnapshot, Registry};
pub use user_id::UserId;
