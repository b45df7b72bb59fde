//! Per-socket transport loop.
//!
//! Registers a connection with the hub, then drains its mailbox to the
//! socket while reading client frames. Whichever side ends first (client
//! close, write failure, mailbox closed by the hub) unregisters the
//! connection.

use axum::extract::ws::{Message, Utf8Bytes, WebSocket};
use futures_util::{SinkExt, StreamExt};

use super::messages::handle_text_message;
use crate::domain::UserId;
use crate::service::Hub;

/// Runs the read/write loop for a single WebSocket connection owned by
/// `user_id`.
pub async fn run_connection(socket: WebSocket, hub: Hub, user_id: UserId) {
    let (connection, mut mailbox) = hub.open_connection(user_id.clone());
    let connection_id = connection.id();
    if let Err(err) = hub.register(connection).await {
        tracing::warn!(%connection_id, %user_id, error = %err, "ws register failed");
        return;
    }
    tracing::debug!(%connection_id, %user_id, "ws connection opened");

    let (mut ws_tx, mut ws_rx) = socket.split();

    loop {
        tokio::select! {
            // Incoming message from client
            msg = ws_rx.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        if let Some(reply) = handle_text_message(text.as_str())
                            && hub.send_to_connection(connection_id, &reply).await.is_err()
                        {
                            break;
                        }
                    }
                    Some(Ok(Message::Close(_)) | Err(_)) | None => break,
                    _ => {}
                }
            }
            // Outbound frame queued by the hub
            frame = mailbox.recv() => {
                let Some(frame) = frame else {
                    // Unregistered elsewhere or hub shut down.
                    let _ = ws_tx.close().await;
                    break;
                };
                match Utf8Bytes::try_from(frame) {
                    Ok(text) => {
                        if ws_tx.send(Message::Text(text)).await.is_err() {
                            break;
                        }
                    }
                    Err(err) => {
                        tracing::warn!(%connection_id, error = %err, "skipping non-UTF-8 frame");
                    }
                }
            }
        }
    }

    if let Err(err) = hub.unregister(connection_id).await {
        tracing::debug!(%connection_id, error = %err, "ws unregister after hub shutdown");
    }
    tracing::debug!(%connection_id, %user_id, "ws connection closed");
}
