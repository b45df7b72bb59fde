//! Capability trait for real-time delivery.
//!
//! Collaborators that only need to push events (the notification adapter,
//! business services) depend on [`RealtimeService`] rather than on [`Hub`]
//! directly, so tests can swap in a recorder.

use std::future::Future;

use super::Hub;
use crate::domain::{ConnectionId, Envelope, UserId};
use crate::error::HubError;

/// Send and presence operations offered by a real-time hub.
pub trait RealtimeService: Send + Sync {
    /// Sends to one connection; unknown connections are a no-op.
    fn send_to_connection(
        &self,
        connection_id: ConnectionId,
        envelope: &Envelope,
    ) -> impl Future<Output = Result<(), HubError>> + Send;

    /// Sends to every connection of a user; offline users are a no-op.
    fn send_to_user(
        &self,
        user_id: &UserId,
        envelope: &Envelope,
    ) -> impl Future<Output = Result<(), HubError>> + Send;

    /// Sends to every connection.
    fn broadcast(&self, envelope: &Envelope) -> impl Future<Output = Result<(), HubError>> + Send;

    /// Sends to every connection but one.
    fn broadcast_except(
        &self,
        exclude: ConnectionId,
        envelope: &Envelope,
    ) -> impl Future<Output = Result<(), HubError>> + Send;

    /// Users holding at least one connection.
    fn online_users(&self) -> impl Future<Output = Vec<UserId>> + Send;

    /// Whether a user holds at least one connection.
    fn is_user_online(&self, user_id: &UserId) -> impl Future<Output = bool> + Send;

    /// Number of connections a user holds.
    fn user_connections(&self, user_id: &UserId) -> impl Future<Output = usize> + Send;

    /// Number of connections overall.
    fn total_connections(&self) -> impl Future<Output = usize> + Send;
}

impl RealtimeService for Hub {
    fn send_to_connection(
        &self,
        connection_id: ConnectionId,
        envelope: &Envelope,
    ) -> impl Future<Output = Result<(), HubError>> + Send {
        Self::send_to_connection(self, connection_id, envelope)
    }

    fn send_to_user(
        &self,
        user_id: &UserId,
        envelope: &Envelope,
    ) -> impl Future<Output = Result<(), HubError>> + Send {
        Self::send_to_user(self, user_id, envelope)
    }

    fn broadcast(&self, envelope: &Envelope) -> impl Future<Output = Result<(), HubError>> + Send {
        Self::broadcast(self, envelope)
    }

    fn broadcast_except(
        &self,
        exclude: ConnectionId,
        envelope: &Envelope,
    ) -> impl Future<Output = Result<(), HubError>> + Send {
        Self::broadcast_except(self, exclude, envelope)
    }

    fn online_users(&self) -> impl Future<Output = Vec<UserId>> + Send {
        Self::online_users(self)
    }

    fn is_user_online(&self, user_id: &UserId) -> impl Future<Output = bool> + Send {
        Self::is_user_online(self, user_id)
    }

    fn user_connections(&self, user_id: &UserId) -> impl Future<Output = usize> + Send {
        Self::user_connections(self, user_id)
    }

    fn total_connections(&self) -> impl Future<Output = usize> + Send {
        Self::total_connections(self)
    }
}
