//! Connection registry owned by the hub coordinator.
//!
//! Holds two indexes that are always updated together:
//!
//! - `connections`: connection id → [`Connection`]
//! - `by_user`: user id → set of connection ids
//!
//! A connection id is in `by_user[u]` exactly when it is registered and owned
//! by `u`, so the sizes of all user sets add up to the number of connections.
//! The registry has no interior locking; the coordinator is its only owner.
//! Readers on other tasks go through a [`PresenceSnapshot`] instead.

use std::collections::{HashMap, HashSet};

use super::{Connection, ConnectionId, UserId};

/// Result of inserting a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Insertion {
    /// The connection was added; carries the owner's new connection count.
    Added {
        /// Connections the user holds after the insert.
        user_connections: usize,
    },
    /// A connection with the same id is already registered; nothing changed.
    Duplicate,
}

/// A connection taken out of the registry.
#[derive(Debug)]
pub struct Removal {
    /// The removed record. Dropping it closes its mailbox.
    pub connection: Connection,
    /// Connections the owner still holds after the removal.
    pub user_connections: usize,
}

/// In-memory index of live connections.
#[derive(Debug, Default)]
pub struct Registry {
    connections: HashMap<ConnectionId, Connection>,
    by_user: HashMap<UserId, HashSet<ConnectionId>>,
}

impl Registry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a connection and indexes it under its owner.
    pub fn insert(&mut self, connection: Connection) -> Insertion {
        let id = connection.id();
        if self.connections.contains_key(&id) {
            return Insertion::Duplicate;
        }
        let ids = self
            .by_user
            .entry(connection.user_id().clone())
            .or_default();
        ids.insert(id);
        let user_connections = ids.len();
        self.connections.insert(id, connection);
        Insertion::Added { user_connections }
    }

    /// Removes a connection from both indexes.
    ///
    /// Returns `None` if the id is not registered, which makes repeated
    /// removal a no-op. A user whose last connection goes away is dropped
    /// from `by_user` entirely.
    pub fn remove(&mut self, id: ConnectionId) -> Option<Removal> {
        let connection = self.connections.remove(&id)?;
        let user_id = connection.user_id();
        let user_connections = match self.by_user.get_mut(user_id) {
            Some(ids) => {
                ids.remove(&id);
                ids.len()
            }
            None => 0,
        };
        if user_connections == 0 {
            self.by_user.remove(user_id);
        }
        Some(Removal {
            connection,
            user_connections,
        })
    }

    /// Looks up a connection by id.
    #[must_use]
    pub fn get(&self, id: ConnectionId) -> Option<&Connection> {
        self.connections.get(&id)
    }

    /// Iterates over every connection owned by `user_id`.
    pub fn user_connections<'a>(
        &'a self,
        user_id: &UserId,
    ) -> impl Iterator<Item = &'a Connection> + 'a {
        self.by_user
            .get(user_id)
            .into_iter()
            .flatten()
            .filter_map(|id| self.connections.get(id))
    }

    /// Iterates over every registered connection.
    pub fn iter(&self) -> impl Iterator<Item = &Connection> {
        self.connections.values()
    }

    /// Returns the number of registered connections.
    #[must_use]
    pub fn len(&self) -> usize {
        self.connections.len()
    }

    /// Returns `true` if nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }

    /// Builds a read-only copy of the per-user connection counts.
    #[must_use]
    pub fn snapshot(&self) -> PresenceSnapshot {
        PresenceSnapshot {
            by_user: self
                .by_user
                .iter()
                .map(|(user, ids)| (user.clone(), ids.len()))
                .collect(),
            total: self.connections.len(),
        }
    }

    /// Checks that both indexes describe the same set of connections.
    #[cfg(test)]
    pub(crate) fn is_consistent(&self) -> bool {
        let indexed: usize = self.by_user.values().map(HashSet::len).sum();
        indexed == self.connections.len()
            && self.by_user.iter().all(|(user, ids)| {
                !ids.is_empty()
                    && ids.iter().all(|id| {
                        self.connections
                            .get(id)
                            .is_some_and(|c| c.user_id() == user)
                    })
            })
    }
}

/// Point-in-time view of who is online, shared with query callers.
///
/// Only the coordinator writes it, keeping it in step with the
/// [`Registry`] after every register and unregister.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PresenceSnapshot {
    by_user: HashMap<UserId, usize>,
    total: usize,
}

impl PresenceSnapshot {
    /// Records that `user_id` now holds `user_connections` connections and
    /// adjusts the total by one connection added or removed.
    pub fn apply(&mut self, user_id: &UserId, user_connections: usize, added: bool) {
        if added {
            self.total = self.total.saturating_add(1);
        } else {
            self.total = self.total.saturating_sub(1);
        }
        if user_connections == 0 {
            self.by_user.remove(user_id);
        } else {
            self.by_user.insert(user_id.clone(), user_connections);
        }
    }

    /// Returns the users holding at least one connection, sorted.
    #[must_use]
    pub fn online_users(&self) -> Vec<UserId> {
        let mut users: Vec<UserId> = self.by_user.keys().cloned().collect();
        users.sort();
        users
    }

    /// Returns `true` if the user holds at least one connection.
    #[must_use]
    pub fn is_online(&self, user_id: &UserId) -> bool {
        self.by_user.get(user_id).is_some_and(|n| *n > 0)
    }

    /// Returns how many connections the user holds.
    #[must_use]
    pub fn user_connections(&self, user_id: &UserId) -> usize {
        self.by_user.get(user_id).copied().unwrap_or(0)
    }

    /// Returns the number of connections across all users.
    #[must_use]
    pub const fn total_connections(&self) -> usize {
        self.total
    }

    /// Returns the number of distinct online users.
    #[must_use]
    pub fn online_user_count(&self) -> usize {
        self.by_user.len()
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::domain::Mailbox;

    fn conn(user: &str) -> (Connection, Mailbox) {
        Connection::new(UserId::from(user), 8)
    }

    #[test]
    fn insert_indexes_by_user() {
        let mut reg = Registry::new();
        let (c1, _m1) = conn("u1");
        let (c2, _m2) = conn("u1");
        let (c3, _m3) = conn("u2");

        assert_eq!(reg.insert(c1), Insertion::Added { user_connections: 1 });
        assert_eq!(reg.insert(c2), Insertion::Added { user_connections: 2 });
        assert_eq!(reg.insert(c3), Insertion::Added { user_connections: 1 });

        assert_eq!(reg.len(), 3);
        assert_eq!(reg.user_connections(&UserId::from("u1")).count(), 2);
        assert_eq!(reg.user_connections(&UserId::from("nobody")).count(), 0);
        assert!(reg.is_consistent());
    }

    #[test]
    fn remove_is_idempotent() {
        let mut reg = Registry::new();
        let (c1, _m1) = conn("u1");
        let id = c1.id();
        let _ = reg.insert(c1);

        let Some(removal) = reg.remove(id) else {
            panic!("expected removal");
        };
        assert_eq!(removal.user_connections, 0);
        assert!(reg.remove(id).is_none());
        assert!(reg.is_empty());
        assert!(reg.is_consistent());
    }

    #[test]
    fn last_connection_drops_user_entry() {
        let mut reg = Registry::new();
        let (c1, _m1) = conn("u1");
        let (c2, _m2) = conn("u1");
        let (id1, id2) = (c1.id(), c2.id());
        let _ = reg.insert(c1);
        let _ = reg.insert(c2);

        let first = reg.remove(id1).map(|r| r.user_connections);
        assert_eq!(first, Some(1));
        assert_eq!(reg.snapshot().online_users(), vec![UserId::from("u1")]);

        let second = reg.remove(id2).map(|r| r.user_connections);
        assert_eq!(second, Some(0));
        assert!(reg.snapshot().online_users().is_empty());
        assert!(reg.is_consistent());
    }

    #[test]
    fn removing_closes_mailbox() {
        let mut reg = Registry::new();
        let (c1, mut m1) = conn("u1");
        let id = c1.id();
        let _ = reg.insert(c1);
        drop(reg.remove(id));
        assert!(m1.try_recv().is_none());
        assert!(m1.is_closed());
    }

    #[test]
    fn snapshot_tracks_incremental_updates() {
        let mut reg = Registry::new();
        let mut view = PresenceSnapshot::default();
        let (c1, _m1) = conn("u1");
        let (c2, _m2) = conn("u2");
        let (id1, id2) = (c1.id(), c2.id());

        for c in [c1, c2] {
            let user = c.user_id().clone();
            if let Insertion::Added { user_connections } = reg.insert(c) {
                view.apply(&user, user_connections, true);
            }
        }
        assert_eq!(view, reg.snapshot());

        for id in [id1, id2] {
            if let Some(r) = reg.remove(id) {
                view.apply(r.connection.user_id(), r.user_connections, false);
            }
            assert_eq!(view, reg.snapshot());
        }
        assert_eq!(view.total_connections(), 0);
    }

    #[test]
    fn snapshot_queries() {
        let mut view = PresenceSnapshot::default();
        let u1 = UserId::from("u1");
        view.apply(&u1, 1, true);
        view.apply(&u1, 2, true);

        assert!(view.is_online(&u1));
        assert!(!view.is_online(&UserId::from("u2")));
        assert_eq!(view.user_connections(&u1), 2);
        assert_eq!(view.total_connections(), 2);
        assert_eq!(view.online_user_count(), 1);
    }
}
