//! Synthetic presence events.
//!
//! A user comes online when their connection count goes from 0 to 1 and
//! goes offline when it drops back to 0. Intermediate changes (second tab,
//! closing one of two devices) produce nothing.

use crate::domain::{Envelope, UserId};

/// Turns connection-count transitions into `user_online` / `user_offline`
/// envelopes.
#[derive(Debug, Clone, Copy, Default)]
pub struct PresenceNotifier;

impl PresenceNotifier {
    /// Called after a connection was registered. Returns a `user_online`
    /// event if it was the user's first.
    #[must_use]
    pub fn on_registered(&self, user_id: &UserId, user_connections: usize) -> Option<Envelope> {
        (user_connections == 1).then(|| Envelope::presence(true, user_id.clone(), 1))
    }

    /// Called after a connection was unregistered. Returns a `user_offline`
    /// event if it was the user's last.
    #[must_use]
    pub fn on_unregistered(&self, user_id: &UserId, user_connections: usize) -> Option<Envelope> {
        (user_connections == 0).then(|| Envelope::presence(false, user_id.clone(), 0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::EventType;

    #[test]
    fn only_first_connection_is_online_transition() {
        let n = PresenceNotifier;
        let u = UserId::from("u1");
        let first = n.on_registered(&u, 1).map(|e| e.event_type());
        assert_eq!(first, Some(EventType::UserOnline));
        assert!(n.on_registered(&u, 2).is_none());
    }

    #[test]
    fn only_last_connection_is_offline_transition() {
        let n = PresenceNotifier;
        let u = UserId::from("u1");
        assert!(n.on_unregistered(&u, 1).is_none());
        let last = n.on_unregistered(&u, 0).map(|e| e.event_type());
        assert_eq!(last, Some(EventType::UserOffline));
    }
}
