use axum::extract::ws::{Message, WebSocket};
use bson::oid::ObjectId;
use dashmap::DashMap;
use futures::stream::SplitSink;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::task::AbortHandle;
use tracing::debug;

pub type WsSender = Arc<Mutex<SplitSink<WebSocket, Message>>>;

struct Connection {
    user_id: Option<ObjectId>,
    subscriptions: HashMap<String, AbortHandle>,
}

/// Tracks open WebSocket connections and the publication tasks each one runs.
/// A user may hold several connections (tabs, devices); anonymous ones have no user.
pub struct WsStorage {
    connections: DashMap<String, Connection>,
}

impl WsStorage {
    pub fn new() -> Self {
        Self {
            connections: DashMap::new(),
        }
    }

    pub fn add(&self, connection_id: &str, user_id: Option<ObjectId>) {
        self.connections.insert(
            connection_id.to_string(),
            Connection {
                user_id,
                subscriptions: HashMap::new(),
            },
        );
    }

    /// Registers a running subscription. A previous subscription with the
    /// same id on this connection is aborted. Returns `false` (and aborts
    /// `handle`) when the connection is already gone.
    pub fn add_subscription(&self, connection_id: &str, sub_id: String, handle: AbortHandle) -> bool {
        match self.connections.get_mut(connection_id) {
            Some(mut conn) => {
                if let Some(previous) = conn.subscriptions.insert(sub_id, handle) {
                    previous.abort();
                }
                true
            }
            None => {
                handle.abort();
                false
            }
        }
    }

    pub fn remove_subscription(&self, connection_id: &str, sub_id: &str) -> bool {
        let removed = self
            .connections
            .get_mut(connection_id)
            .and_then(|mut conn| conn.subscriptions.remove(sub_id));
        match removed {
            Some(handle) => {
                handle.abort();
                true
            }
            None => false,
        }
    }

    /// Drops the connection and aborts all of its subscriptions.
    pub fn remove(&self, connection_id: &str) {
        if let Some((_, conn)) = self.connections.remove(connection_id) {
            for handle in conn.subscriptions.values() {
                handle.abort();
            }
            debug!(
                %connection_id,
                user_id = ?conn.user_id,
                aborted = conn.subscriptions.len(),
                "Connection removed"
            );
        }
    }

    pub fn subscription_count(&self, connection_id: &str) -> usize {
        self.connections
            .get(connection_id)
            .map(|conn| conn.subscriptions.len())
            .unwrap_or(0)
    }

    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }
}

impl Default for WsStorage {
    fn default() -> Self {
        Self::new()
    }
}
