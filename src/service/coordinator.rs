//! The hub's single writer.
//!
//! [`Coordinator`] owns the [`Registry`] and processes [`HubCommand`]s one
//! at a time from a bounded queue, so every mutation is totally ordered and
//! no lock is needed on the write path. After each register/unregister it
//! updates the shared [`PresenceSnapshot`] that query callers read.
//!
//! Delivery is non-blocking: a full mailbox drops the frame and bumps the
//! drop counter instead of stalling every other connection.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::Utc;
use tokio::sync::{RwLock, mpsc, oneshot};

use super::presence::PresenceNotifier;
use crate::domain::registry::Insertion;
use crate::domain::{
    Connection, ConnectionId, DeliveryOutcome, Envelope, Frame, PresenceSnapshot, Registry, UserId,
};

/// Who a frame is addressed to.
#[derive(Debug, Clone)]
pub enum Target {
    /// One connection.
    Connection(ConnectionId),
    /// Every connection of one user.
    User(UserId),
    /// Every registered connection.
    All,
    /// Every registered connection except one.
    AllExcept(ConnectionId),
}

/// A request for the coordinator.
#[derive(Debug)]
pub enum HubCommand {
    /// Add a connection to the registry.
    Register(Connection),
    /// Remove a connection from the registry and close its mailbox.
    Unregister(ConnectionId),
    /// Enqueue an already-serialized frame onto the target mailboxes.
    Deliver {
        /// Addressees.
        target: Target,
        /// Serialized envelope shared by every addressee.
        frame: Frame,
    },
    /// Acknowledge once every earlier command has been processed.
    Flush(oneshot::Sender<()>),
}

/// Delivery counters shared between the coordinator and hub handles.
#[derive(Debug, Default)]
pub struct DeliveryStats {
    delivered: AtomicU64,
    dropped: AtomicU64,
}

impl DeliveryStats {
    /// Frames successfully enqueued onto a mailbox.
    #[must_use]
    pub fn delivered(&self) -> u64 {
        self.delivered.load(Ordering::Relaxed)
    }

    /// Frames dropped because a mailbox was full or already closed.
    #[must_use]
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    fn record(&self, outcome: DeliveryOutcome) {
        let counter = if outcome.is_dropped() {
            &self.dropped
        } else {
            &self.delivered
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }
}

/// Single-owner worker that serializes all registry mutations.
#[derive(Debug)]
pub struct Coordinator {
    registry: Registry,
    presence: Arc<RwLock<PresenceSnapshot>>,
    stats: Arc<DeliveryStats>,
    notifier: PresenceNotifier,
}

impl Coordinator {
    /// Creates a coordinator publishing presence into `presence` and
    /// counters into `stats`.
    #[must_use]
    pub fn new(presence: Arc<RwLock<PresenceSnapshot>>, stats: Arc<DeliveryStats>) -> Self {
        Self {
            registry: Registry::new(),
            presence,
            stats,
            notifier: PresenceNotifier,
        }
    }

    /// Processes commands until every sender is dropped.
    ///
    /// On exit the registry is dropped, which closes every remaining
    /// mailbox so transport drain loops terminate.
    pub async fn run(mut self, mut commands: mpsc::Receiver<HubCommand>) {
        *self.presence.write().await = self.registry.snapshot();
        tracing::info!("hub coordinator started");

        while let Some(command) = commands.recv().await {
            self.handle(command).await;
        }

        tracing::info!(
            remaining = self.registry.len(),
            "hub coordinator stopped, closing remaining mailboxes"
        );
    }

    async fn handle(&mut self, command: HubCommand) {
        match command {
            HubCommand::Register(connection) => self.register(connection).await,
            HubCommand::Unregister(id) => self.unregister(id).await,
            HubCommand::Deliver { target, frame } => self.deliver(&target, &frame),
            HubCommand::Flush(ack) => {
                let _ = ack.send(());
            }
        }
    }

    async fn register(&mut self, connection: Connection) {
        let connection_id = connection.id();
        let user_id = connection.user_id().clone();

        let user_connections = match self.registry.insert(connection) {
            Insertion::Added { user_connections } => user_connections,
            Insertion::Duplicate => {
                tracing::warn!(%connection_id, %user_id, "duplicate connection id ignored");
                return;
            }
        };

        self.presence
            .write()
            .await
            .apply(&user_id, user_connections, true);

        tracing::debug!(
            %connection_id,
            %user_id,
            user_connections,
            total = self.registry.len(),
            "connection registered"
        );

        if let Some(event) = self.notifier.on_registered(&user_id, user_connections) {
            self.broadcast_presence(&event);
        }
    }

    async fn unregister(&mut self, connection_id: ConnectionId) {
        let Some(removal) = self.registry.remove(connection_id) else {
            return;
        };
        let user_id = removal.connection.user_id().clone();
        let user_connections = removal.user_connections;
        // Closes the mailbox.
        drop(removal);

        self.presence
            .write()
            .await
            .apply(&user_id, user_connections, false);

        tracing::debug!(
            %connection_id,
            %user_id,
            user_connections,
            total = self.registry.len(),
            "connection unregistered"
        );

        if let Some(event) = self.notifier.on_unregistered(&user_id, user_connections) {
            self.broadcast_presence(&event);
        }
    }

    fn broadcast_presence(&self, event: &Envelope) {
        match event.to_frame(Utc::now()) {
            Ok(frame) => self.deliver(&Target::All, &frame),
            Err(err) => {
                tracing::error!(
                    error = %err,
                    event = event.event_type().as_str(),
                    "presence event serialization failed"
                );
            }
        }
    }

    fn deliver(&self, target: &Target, frame: &Frame) {
        match target {
            Target::Connection(id) => {
                if let Some(connection) = self.registry.get(*id) {
                    self.deliver_to(connection, frame);
                }
            }
            Target::User(user_id) => {
                for connection in self.registry.user_connections(user_id) {
                    self.deliver_to(connection, frame);
                }
            }
            Target::All => {
                for connection in self.registry.iter() {
                    self.deliver_to(connection, frame);
                }
            }
            Target::AllExcept(excluded) => {
                for connection in self.registry.iter().filter(|c| c.id() != *excluded) {
                    self.deliver_to(connection, frame);
                }
            }
        }
    }

    fn deliver_to(&self, connection: &Connection, frame: &Frame) {
        let outcome = connection.try_deliver(frame.clone());
        self.stats.record(outcome);
        match outcome {
            DeliveryOutcome::Queued => {}
            DeliveryOutcome::Full => {
                tracing::warn!(
                    connection_id = %connection.id(),
                    user_id = %connection.user_id(),
                    "mailbox full, message dropped"
                );
            }
            DeliveryOutcome::Closed => {
                tracing::debug!(
                    connection_id = %connection.id(),
                    user_id = %connection.user_id(),
                    "mailbox closed before unregister, message dropped"
                );
            }
        }
    }

    #[cfg(test)]
    fn registry(&self) -> &Registry {
        &self.registry
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::domain::{EventType, Mailbox};

    fn coordinator() -> Coordinator {
        Coordinator::new(
            Arc::new(RwLock::new(PresenceSnapshot::default())),
            Arc::new(DeliveryStats::default()),
        )
    }

    fn open(user: &str, capacity: usize) -> (Connection, Mailbox) {
        Connection::new(UserId::from(user), capacity)
    }

    fn drain_types(mailbox: &mut Mailbox) -> Vec<String> {
        let mut types = Vec::new();
        while let Some(frame) = mailbox.try_recv() {
            let Ok(json) = serde_json::from_slice::<serde_json::Value>(&frame) else {
                panic!("frame is not JSON");
            };
            types.push(json["type"].as_str().unwrap_or_default().to_string());
        }
        types
    }

    #[tokio::test]
    async fn registry_and_snapshot_stay_consistent() {
        let mut coord = coordinator();
        let (c1, _m1) = open("u1", 8);
        let (c2, _m2) = open("u1", 8);
        let id1 = c1.id();

        coord.register(c1).await;
        coord.register(c2).await;
        assert!(coord.registry().is_consistent());
        assert_eq!(*coord.presence.read().await, coord.registry().snapshot());

        coord.unregister(id1).await;
        assert!(coord.registry().is_consistent());
        assert_eq!(*coord.presence.read().await, coord.registry().snapshot());
    }

    #[tokio::test]
    async fn first_connection_announces_online_to_itself() {
        let mut coord = coordinator();
        let (c1, mut m1) = open("u1", 8);
        coord.register(c1).await;
        assert_eq!(drain_types(&mut m1), vec!["user_online"]);
    }

    #[tokio::test]
    async fn duplicate_register_is_ignored() {
        let mut coord = coordinator();
        let (c1, _m1) = open("u1", 8);
        let id = c1.id();
        coord.register(c1).await;

        let (dup, mut dup_box) = Connection::with_id(id, UserId::from("u2"), 8);
        coord.register(dup).await;

        assert_eq!(coord.registry().len(), 1);
        assert!(!coord.presence.read().await.is_online(&UserId::from("u2")));
        assert!(coord.registry().is_consistent());
        // The rejected record was dropped, closing its mailbox.
        assert!(dup_box.recv().await.is_none());
    }

    #[tokio::test]
    async fn full_mailbox_counts_drop_and_spares_others() {
        let mut coord = coordinator();
        let (slow, mut slow_box) = open("slow", 1);
        let (fast, mut fast_box) = open("fast", 8);
        coord.register(slow).await;
        coord.register(fast).await;
        // slow: its own online event already fills the single slot.
        let dropped_before = coord.stats.dropped();

        let Ok(frame) = Envelope::pong().to_frame(Utc::now()) else {
            panic!("serialization failed");
        };
        coord.deliver(&Target::All, &frame);

        assert!(coord.stats.dropped() > dropped_before);
        assert_eq!(drain_types(&mut slow_box), vec!["user_online"]);
        let fast_types = drain_types(&mut fast_box);
        assert_eq!(fast_types.last().map(String::as_str), Some("pong"));
    }

    #[tokio::test]
    async fn flush_acknowledges() {
        let mut coord = coordinator();
        let (tx, rx) = oneshot::channel();
        coord.handle(HubCommand::Flush(tx)).await;
        assert!(rx.await.is_ok());
    }

    #[tokio::test]
    async fn broadcast_except_skips_origin() {
        let mut coord = coordinator();
        let (a, mut a_box) = open("a", 8);
        let (b, mut b_box) = open("b", 8);
        let a_id = a.id();
        coord.register(a).await;
        coord.register(b).await;
        let _ = drain_types(&mut a_box);
        let _ = drain_types(&mut b_box);

        let env = Envelope::new(EventType::SystemMessage, crate::domain::Payload::Empty);
        let Ok(frame) = env.to_frame(Utc::now()) else {
            panic!("serialization failed");
        };
        coord.deliver(&Target::AllExcept(a_id), &frame);

        assert!(drain_types(&mut a_box).is_empty());
        assert_eq!(drain_types(&mut b_box), vec!["system_message"]);
    }
}
