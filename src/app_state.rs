//! Shared application state injected into all Axum handlers.

use crate::service::{Hub, NotificationAdapter};

/// Shared application state available to all handlers via Axum's
/// `State` extractor.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Hub handle for registration, sends, and presence queries.
    pub hub: Hub,
    /// Notification facade over the same hub.
    pub notifier: NotificationAdapter<Hub>,
}

impl AppState {
    /// Builds the state around a running hub.
    #[must_use]
    pub fn new(hub: Hub) -> Self {
        let notifier = NotificationAdapter::new(hub.clone());
        Self { hub, notifier }
    }
}
