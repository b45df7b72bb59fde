//! Frames a client may send over the socket.
//!
//! The hub itself never reads client input; the transport adapter only
//! understands liveness probes and ignores everything else.

use serde::Deserialize;

use crate::domain::{Envelope, EventType};

/// Inbound client frame. Mirrors the outbound envelope shape; unknown
/// fields are ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct ClientMessage {
    /// Message type discriminator.
    #[serde(rename = "type")]
    pub msg_type: EventType,
    /// Optional correlation id echoed in the reply.
    #[serde(default)]
    pub message_id: Option<String>,
}

/// Handles a text frame from the client, returning the envelope to send
/// back to the same connection, if any.
#[must_use]
pub fn handle_text_message(text: &str) -> Option<Envelope> {
    let msg = match serde_json::from_str::<ClientMessage>(text) {
        Ok(msg) => msg,
        Err(err) => {
            tracing::debug!(error = %err, "ignoring malformed client frame");
            return None;
        }
    };

    match msg.msg_type {
        EventType::Ping => {
            let pong = Envelope::pong();
            Some(match msg.message_id {
                Some(id) => pong.with_message_id(id),
                None => pong,
            })
        }
        EventType::Pong => None,
        other => {
            tracing::debug!(msg_type = other.as_str(), "ignoring unsupported client frame");
            None
        }
    }
}
