//! WebSocket transport adapter.
//!
//! The endpoint at `/ws` turns each upgraded socket into a hub connection:
//! the hub fills the connection's mailbox, this layer drains it to the wire.

pub mod connection;
pub mod handler;
pub mod messages;
