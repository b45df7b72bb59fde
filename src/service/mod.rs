//! Service layer: the hub coordinator, its public handle, and the adapters
//! collaborators use to push events through it.
//!
//! ```text
//! business layer ──► NotificationAdapter ──► RealtimeService (Hub)
//! transport      ──► Hub::register / unregister      │
//!                                                    ▼
//!                              Coordinator (single writer, owns Registry)
//!                                                    │ try_send
//!                                                    ▼
//!                                            per-connection Mailbox
//! ```

pub mod coordinator;
pub mod hub;
pub mod notification;
pub mod presence;
pub mod realtime;

pub use hub::{Hub, HubStats};
pub use notification::NotificationAdapter;
pub use presence::PresenceNotifier;
pub use realtime::RealtimeService;
