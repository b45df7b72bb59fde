//! Public handle to the presence and fan-out hub.
//!
//! [`Hub`] is cheap to clone. Every mutating call stamps and serializes on
//! the caller's task, then hands a [`HubCommand`] to the coordinator's
//! bounded queue; it never waits on a mailbox. Presence queries read a
//! snapshot behind a short-held lock and never queue behind sends.

use std::sync::Arc;

use chrono::Utc;
use tokio::sync::{RwLock, mpsc, oneshot};

use super::coordinator::{Coordinator, DeliveryStats, HubCommand, Target};
use crate::config::HubConfig;
use crate::domain::{Connection, ConnectionId, Envelope, Mailbox, PresenceSnapshot, UserId};
use crate::error::HubError;

/// Delivery counters at a point in time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HubStats {
    /// Frames enqueued onto a mailbox since startup.
    pub delivered: u64,
    /// Frames dropped on a full or closed mailbox since startup.
    pub dropped: u64,
}

/// Handle to the hub coordinator.
///
/// All clones talk to the same coordinator task, which runs until the last
/// clone is dropped.
#[derive(Debug, Clone)]
pub struct Hub {
    commands: mpsc::Sender<HubCommand>,
    presence: Arc<RwLock<PresenceSnapshot>>,
    stats: Arc<DeliveryStats>,
    mailbox_capacity: usize,
}

impl Hub {
    /// Spawns the coordinator on the current Tokio runtime.
    ///
    /// `mailbox_capacity` bounds each connection's outbound queue and
    /// `command_capacity` bounds the coordinator's input queue. Both are
    /// clamped to at least one.
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime.
    #[must_use]
    pub fn new(mailbox_capacity: usize, command_capacity: usize) -> Self {
        let (commands, receiver) = mpsc::channel(command_capacity.max(1));
        let presence = Arc::new(RwLock::new(PresenceSnapshot::default()));
        let stats = Arc::new(DeliveryStats::default());

        let coordinator = Coordinator::new(Arc::clone(&presence), Arc::clone(&stats));
        tokio::spawn(coordinator.run(receiver));

        Self {
            commands,
            presence,
            stats,
            mailbox_capacity: mailbox_capacity.max(1),
        }
    }

    /// Spawns the coordinator with capacities from `config`.
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime.
    #[must_use]
    pub fn from_config(config: &HubConfig) -> Self {
        Self::new(config.mailbox_capacity, config.command_capacity)
    }

    /// Builds a connection for `user_id` using the configured mailbox
    /// capacity. Pass the connection to [`Hub::register`] and keep the
    /// mailbox for draining.
    #[must_use]
    pub fn open_connection(&self, user_id: UserId) -> (Connection, Mailbox) {
        Connection::new(user_id, self.mailbox_capacity)
    }

    /// Registers a connection. The user's first connection triggers a
    /// `user_online` broadcast once registration completes.
    ///
    /// # Errors
    ///
    /// Returns [`HubError::HubClosed`] if the coordinator has stopped.
    pub async fn register(&self, connection: Connection) -> Result<(), HubError> {
        self.submit(HubCommand::Register(connection)).await
    }

    /// Unregisters a connection and closes its mailbox. Unknown ids are a
    /// no-op, so calling this twice is safe. The user's last connection
    /// triggers a `user_offline` broadcast.
    ///
    /// # Errors
    ///
    /// Returns [`HubError::HubClosed`] if the coordinator has stopped.
    pub async fn unregister(&self, connection_id: ConnectionId) -> Result<(), HubError> {
        self.submit(HubCommand::Unregister(connection_id)).await
    }

    /// Sends to one connection. An unknown connection is a silent no-op and
    /// a full mailbox drops the message.
    ///
    /// # Errors
    ///
    /// Returns [`HubError::Serialization`] before anything is enqueued if
    /// the envelope cannot be serialized, or [`HubError::HubClosed`].
    pub async fn send_to_connection(
        &self,
        connection_id: ConnectionId,
        envelope: &Envelope,
    ) -> Result<(), HubError> {
        self.deliver(Target::Connection(connection_id), envelope).await
    }

    /// Sends to every connection of `user_id`, sharing one serialization.
    /// A user with no connections is a silent no-op; nothing is kept for
    /// later.
    ///
    /// # Errors
    ///
    /// Returns [`HubError::Serialization`] or [`HubError::HubClosed`].
    pub async fn send_to_user(
        &self,
        user_id: &UserId,
        envelope: &Envelope,
    ) -> Result<(), HubError> {
        self.deliver(Target::User(user_id.clone()), envelope).await
    }

    /// Sends to every registered connection.
    ///
    /// # Errors
    ///
    /// Returns [`HubError::Serialization`] or [`HubError::HubClosed`].
    pub async fn broadcast(&self, envelope: &Envelope) -> Result<(), HubError> {
        self.deliver(Target::All, envelope).await
    }

    /// Sends to every registered connection except `exclude`, typically the
    /// originator of the action being announced.
    ///
    /// # Errors
    ///
    /// Returns [`HubError::Serialization`] or [`HubError::HubClosed`].
    pub async fn broadcast_except(
        &self,
        exclude: ConnectionId,
        envelope: &Envelope,
    ) -> Result<(), HubError> {
        self.deliver(Target::AllExcept(exclude), envelope).await
    }

    /// Returns the users that currently hold at least one connection.
    pub async fn online_users(&self) -> Vec<UserId> {
        self.presence.read().await.online_users()
    }

    /// Returns `true` if `user_id` holds at least one connection.
    pub async fn is_user_online(&self, user_id: &UserId) -> bool {
        self.presence.read().await.is_online(user_id)
    }

    /// Returns how many connections `user_id` holds.
    pub async fn user_connections(&self, user_id: &UserId) -> usize {
        self.presence.read().await.user_connections(user_id)
    }

    /// Returns the number of registered connections.
    pub async fn total_connections(&self) -> usize {
        self.presence.read().await.total_connections()
    }

    /// Returns a copy of the whole presence view in one read.
    pub async fn presence_snapshot(&self) -> PresenceSnapshot {
        self.presence.read().await.clone()
    }

    /// Returns delivery counters.
    #[must_use]
    pub fn stats(&self) -> HubStats {
        HubStats {
            delivered: self.stats.delivered(),
            dropped: self.stats.dropped(),
        }
    }

    /// Returns how many messages were dropped on full or closed mailboxes.
    #[must_use]
    pub fn dropped_messages(&self) -> u64 {
        self.stats.dropped()
    }

    /// Waits until the coordinator has processed every request submitted
    /// before this call.
    ///
    /// # Errors
    ///
    /// Returns [`HubError::HubClosed`] if the coordinator has stopped.
    pub async fn flush(&self) -> Result<(), HubError> {
        let (ack, done) = oneshot::channel();
        self.submit(HubCommand::Flush(ack)).await?;
        done.await.map_err(|_| HubError::HubClosed)
    }

    async fn deliver(&self, target: Target, envelope: &Envelope) -> Result<(), HubError> {
        let frame = envelope.to_frame(Utc::now())?;
        self.submit(HubCommand::Deliver { target, frame }).await
    }

    async fn submit(&self, command: HubCommand) -> Result<(), HubError> {
        self.commands
            .send(command)
            .await
            .map_err(|_| HubError::HubClosed)
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::domain::{Frame, Notification, NotificationAction, SystemLevel};

    fn hub() -> Hub {
        Hub::new(16, 64)
    }

    fn event_type(frame: &Frame) -> String {
        let Ok(json) = serde_json::from_slice::<serde_json::Value>(frame) else {
            panic!("frame is not JSON");
        };
        json["type"].as_str().unwrap_or_default().to_string()
    }

    fn drain(mailbox: &mut Mailbox) -> Vec<Frame> {
        let mut frames = Vec::new();
        while let Some(frame) = mailbox.try_recv() {
            frames.push(frame);
        }
        frames
    }

    fn drain_types(mailbox: &mut Mailbox) -> Vec<String> {
        drain(mailbox).iter().map(event_type).collect()
    }

    async fn connect(hub: &Hub, user: &str) -> (ConnectionId, Mailbox) {
        let (conn, mailbox) = hub.open_connection(UserId::from(user));
        let id = conn.id();
        let Ok(()) = hub.register(conn).await else {
            panic!("register failed");
        };
        (id, mailbox)
    }

    async fn assert_counts_consistent(hub: &Hub) {
        let users = hub.online_users().await;
        let mut sum = 0;
        for user in &users {
            sum += hub.user_connections(user).await;
        }
        assert_eq!(hub.total_connections().await, sum);
    }

    fn notification_for(user: Option<&str>) -> Notification {
        Notification {
            id: uuid::Uuid::new_v4(),
            user_id: user.map(UserId::from),
            kind: "comment".to_string(),
            title: "hello".to_string(),
            message: "world".to_string(),
            data: None,
            read: false,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn three_connection_scenario() {
        let hub = hub();
        let u1 = UserId::from("u1");
        let (c1, mut m1) = connect(&hub, "u1").await;
        let (c2, mut m2) = connect(&hub, "u1").await;
        let (_c3, mut m3) = connect(&hub, "u2").await;
        let Ok(()) = hub.flush().await else {
            panic!("flush failed");
        };

        assert_eq!(hub.user_connections(&u1).await, 2);
        assert_eq!(hub.total_connections().await, 3);
        assert_counts_consistent(&hub).await;
        let _ = (drain(&mut m1), drain(&mut m2), drain(&mut m3));

        let env = Envelope::notification(notification_for(Some("u1")), NotificationAction::Created);
        let Ok(()) = hub.send_to_user(&u1, &env).await else {
            panic!("send failed");
        };
        let Ok(()) = hub.flush().await else {
            panic!("flush failed");
        };
        let got1 = drain(&mut m1);
        let got2 = drain(&mut m2);
        assert_eq!(got1.len(), 1);
        assert_eq!(got1, got2);
        assert!(drain(&mut m3).is_empty());

        let Ok(()) = hub.unregister(c1).await else {
            panic!("unregister failed");
        };
        let Ok(()) = hub.flush().await else {
            panic!("flush failed");
        };
        assert_eq!(hub.user_connections(&u1).await, 1);
        assert!(drain(&mut m2).is_empty());
        assert!(drain(&mut m3).is_empty());

        let Ok(()) = hub.unregister(c2).await else {
            panic!("unregister failed");
        };
        let Ok(()) = hub.flush().await else {
            panic!("flush failed");
        };
        assert_eq!(hub.user_connections(&u1).await, 0);
        assert!(!hub.is_user_online(&u1).await);
        assert_eq!(drain_types(&mut m3), vec!["user_offline"]);
        assert_counts_consistent(&hub).await;
    }

    #[tokio::test]
    async fn presence_events_fire_on_edges_only() {
        let hub = hub();
        let (_watch, mut watcher) = connect(&hub, "watcher").await;
        let (a, _ma) = connect(&hub, "alice").await;
        let (b, _mb) = connect(&hub, "alice").await;
        let Ok(()) = hub.flush().await else {
            panic!("flush failed");
        };
        assert_eq!(drain_types(&mut watcher), vec!["user_online", "user_online"]);

        let _ = hub.unregister(a).await;
        let _ = hub.unregister(b).await;
        let _ = hub.unregister(b).await;
        let Ok(()) = hub.flush().await else {
            panic!("flush failed");
        };
        assert_eq!(drain_types(&mut watcher), vec!["user_offline"]);
    }

    #[tokio::test]
    async fn unregister_closes_mailbox() {
        let hub = hub();
        let (id, mut mailbox) = connect(&hub, "u1").await;
        let _ = hub.unregister(id).await;

        let mut frames = 0;
        while tokio::time::timeout(Duration::from_secs(1), mailbox.recv())
            .await
            .ok()
            .flatten()
            .is_some()
        {
            frames += 1;
        }
        assert_eq!(frames, 1);
        assert!(mailbox.is_closed());
    }

    #[tokio::test]
    async fn stalled_consumer_does_not_block_others() {
        let hub = Hub::new(2, 64);
        let (_slow, _slow_box) = connect(&hub, "slow").await;
        let (_fast, mut fast_box) = connect(&hub, "fast").await;
        let Ok(()) = hub.flush().await else {
            panic!("flush failed");
        };

        for i in 0..10 {
            let env = Envelope::system(format!("tick {i}"), SystemLevel::Info);
            let Ok(()) = hub.broadcast(&env).await else {
                panic!("broadcast failed");
            };
            let Ok(Some(frame)) =
                tokio::time::timeout(Duration::from_secs(1), fast_box.recv()).await
            else {
                panic!("fast consumer starved");
            };
            // Skip the leftover presence frame on the first round.
            if event_type(&frame) == "user_online" {
                let Ok(Some(_)) =
                    tokio::time::timeout(Duration::from_secs(1), fast_box.recv()).await
                else {
                    panic!("fast consumer starved");
                };
            }
        }
        assert!(hub.dropped_messages() >= 8);
        assert!(hub.stats().delivered > 0);
    }

    #[tokio::test]
    async fn send_to_missing_targets_is_silent() {
        let hub = hub();
        let env = Envelope::pong();
        assert!(hub.send_to_connection(ConnectionId::new(), &env).await.is_ok());
        assert!(hub.send_to_user(&UserId::from("ghost"), &env).await.is_ok());
        assert!(hub.flush().await.is_ok());
        assert_eq!(hub.stats(), HubStats { delivered: 0, dropped: 0 });
    }

    #[tokio::test]
    async fn messages_to_one_connection_keep_order() {
        let hub = hub();
        let (id, mut mailbox) = connect(&hub, "u1").await;
        for i in 0..5 {
            let env = Envelope::pong().with_message_id(i.to_string());
            let _ = hub.send_to_connection(id, &env).await;
        }
        let Ok(()) = hub.flush().await else {
            panic!("flush failed");
        };
        let ids: Vec<String> = drain(&mut mailbox)
            .iter()
            .filter_map(|f| serde_json::from_slice::<serde_json::Value>(f).ok())
            .filter_map(|v| v["message_id"].as_str().map(str::to_string))
            .collect();
        assert_eq!(ids, vec!["0", "1", "2", "3", "4"]);
    }

    #[tokio::test]
    async fn broadcast_except_skips_origin() {
        let hub = hub();
        let (a, mut ma) = connect(&hub, "a").await;
        let (_b, mut mb) = connect(&hub, "b").await;
        let _ = hub.flush().await;
        let _ = (drain(&mut ma), drain(&mut mb));

        let _ = hub.broadcast_except(a, &Envelope::pong()).await;
        let _ = hub.flush().await;
        assert!(drain(&mut ma).is_empty());
        assert_eq!(drain_types(&mut mb), vec!["pong"]);
    }

    #[test]
    #[should_panic]
    fn new_requires_a_runtime() {
        let _ = Hub::new(1, 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_clients_keep_counts_consistent() {
        const TASKS: usize = 32;
        const ROUNDS: usize = 50;

        let hub = Hub::new(4, 256);
        let mut handles = Vec::with_capacity(TASKS);
        for task in 0..TASKS {
            let hub = hub.clone();
            handles.push(tokio::spawn(async move {
                let user = UserId::from(format!("user-{}", task % 8));
                let mut kept = Vec::new();
                for round in 0..ROUNDS {
                    let (conn, mailbox) = hub.open_connection(user.clone());
                    let id = conn.id();
                    hub.register(conn).await?;
                    let env = Envelope::system(format!("{task}/{round}"), SystemLevel::Info);
                    hub.broadcast(&env).await?;
                    hub.send_to_user(&user, &env).await?;
                    let _ = hub.is_user_online(&user).await;
                    let _ = hub.total_connections().await;
                    if round % 4 == 0 {
                        kept.push(mailbox);
                    } else {
                        hub.unregister(id).await?;
                        hub.unregister(id).await?;
                    }
                }
                Ok::<usize, HubError>(kept.len())
            }));
        }

        let mut kept = 0;
        for handle in handles {
            let Ok(Ok(n)) = handle.await else {
                panic!("client task failed");
            };
            kept += n;
        }
        let Ok(()) = hub.flush().await else {
            panic!("flush failed");
        };

        assert_eq!(kept, TASKS * ROUNDS.div_ceil(4));
        assert_eq!(hub.total_connections().await, kept);
        assert_counts_consistent(&hub).await;
        assert_eq!(hub.online_users().await.len(), 8);
    }
}
