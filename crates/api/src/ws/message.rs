use serde::{Deserialize, Serialize};
use socium_services::publication::{FeedPageDiff, PublicationData, PublicationName};

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    Sub {
        id: String,
        name: PublicationName,
        #[serde(default)]
        params: serde_json::Value,
    },
    Unsub {
        id: String,
    },
    Ping,
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    Connected {
        user_id: Option<String>,
    },
    /// Initial snapshot of a subscription.
    Ready {
        id: String,
        data: PublicationData,
    },
    Changed {
        id: String,
        diff: FeedPageDiff,
    },
    Count {
        id: String,
        count: u64,
    },
    /// The subscription ended: after `unsub`, or with `error` when it failed.
    Nosub {
        id: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        error: Option<String>,
    },
    Pong,
    Error {
        message: String,
    },
}
