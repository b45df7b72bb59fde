//! Connection record and its outbound mailbox.
//!
//! A [`Connection`] is the hub-side half of a live transport session: an
//! immutable identity plus the producer end of a bounded queue. The matching
//! [`Mailbox`] is the consumer end, drained by the transport layer to the
//! wire. The hub is the only producer and the transport the only consumer.

use bytes::Bytes;
use chrono::{DateTime, Utc};
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;

use super::{ConnectionId, UserId};

/// A pre-serialized outbound message.
///
/// Cloning a `Frame` only bumps a reference count, so one serialization can
/// be shared by every mailbox of a fan-out.
pub type Frame = Bytes;

/// Result of a non-blocking enqueue onto a connection's mailbox.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryOutcome {
    /// The frame was queued.
    Queued,
    /// The mailbox was at capacity; the frame was dropped.
    Full,
    /// The consumer side is gone; the frame was dropped.
    Closed,
}

impl DeliveryOutcome {
    /// Returns `true` if the frame did not make it into the mailbox.
    #[must_use]
    pub const fn is_dropped(self) -> bool {
        !matches!(self, Self::Queued)
    }
}

/// Hub-side record of one live transport session.
///
/// Never mutated after creation. Dropping it closes the mailbox, which lets
/// the draining transport worker terminate.
#[derive(Debug)]
pub struct Connection {
    id: ConnectionId,
    user_id: UserId,
    created_at: DateTime<Utc>,
    sender: mpsc::Sender<Frame>,
}

impl Connection {
    /// Creates a connection for `user_id` with a mailbox holding at most
    /// `capacity` frames (clamped to at least one).
    ///
    /// Returns the connection (handed to the hub) and its [`Mailbox`]
    /// (kept by the transport layer).
    #[must_use]
    pub fn new(user_id: UserId, capacity: usize) -> (Self, Mailbox) {
        Self::with_id(ConnectionId::new(), user_id, capacity)
    }

    /// Like [`Connection::new`] but with an id chosen by the transport.
    ///
    /// The caller guarantees the id is not held by any live connection.
    #[must_use]
    pub fn with_id(id: ConnectionId, user_id: UserId, capacity: usize) -> (Self, Mailbox) {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        let connection = Self {
            id,
            user_id,
            created_at: Utc::now(),
            sender,
        };
        (connection, Mailbox { receiver })
    }

    /// Returns the connection identifier.
    #[must_use]
    pub const fn id(&self) -> ConnectionId {
        self.id
    }

    /// Returns the owning user.
    #[must_use]
    pub const fn user_id(&self) -> &UserId {
        &self.user_id
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Enqueues `frame` without waiting. A full or closed mailbox drops it.
    pub fn try_deliver(&self, frame: Frame) -> DeliveryOutcome {
        match self.sender.try_send(frame) {
            Ok(()) => DeliveryOutcome::Queued,
            Err(TrySendError::Full(_)) => DeliveryOutcome::Full,
            Err(TrySendError::Closed(_)) => DeliveryOutcome::Closed,
        }
    }
}

/// Consumer end of a connection's outbound queue.
///
/// Yields frames in the order the hub enqueued them and returns `None` once
/// the hub has unregistered the connection and every queued frame has been
/// taken.
#[derive(Debug)]
pub struct Mailbox {
    receiver: mpsc::Receiver<Frame>,
}

impl Mailbox {
    /// Waits for the next frame, or `None` once the mailbox is closed and
    /// drained.
    pub async fn recv(&mut self) -> Option<Frame> {
        self.receiver.recv().await
    }

    /// Takes the next frame if one is already queued.
    pub fn try_recv(&mut self) -> Option<Frame> {
        self.receiver.try_recv().ok()
    }

    /// Returns `true` once the producer side has been dropped.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.receiver.is_closed()
    }
}
