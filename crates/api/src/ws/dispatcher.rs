use axum::extract::ws::Message;
use futures::SinkExt;
use tracing::{debug, warn};

use super::message::ServerMessage;
use super::storage::WsSender;

/// Sends one message to a connection. Returns `false` once the socket is closed.
pub async fn send(sender: &WsSender, message: &ServerMessage) -> bool {
    let text = match serde_json::to_string(message) {
        Ok(text) => text,
        Err(e) => {
            warn!(%e, "Failed to encode WS message");
            return false;
        }
    };

    let mut guard = sender.lock().await;
    match guard.send(Message::text(text)).await {
        Ok(()) => true,
        Err(e) => {
            debug!(%e, "Failed to send WS message");
            false
        }
    }
}
