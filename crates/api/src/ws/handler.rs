use axum::{
    extract::{
        Query, State, WebSocketUpgrade,
        ws::{Message, WebSocket},
    },
    response::{IntoResponse, Response},
};
use bson::oid::ObjectId;
use futures::{SinkExt, StreamExt};
use serde::Deserialize;
use socium_services::publication::{FeedPageDiff, Publication, PublicationData};
use std::sync::Arc;
use tokio::sync::{Mutex, broadcast::error::RecvError};
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::dispatcher::send;
use super::message::{ClientMessage, ServerMessage};
use super::storage::WsSender;
use crate::{error::ApiError, state::AppState};

#[derive(Debug, Deserialize)]
pub struct WsParams {
    pub token: Option<String>,
}

pub async fn ws_upgrade(
    State(state): State<AppState>,
    Query(params): Query<WsParams>,
    ws: WebSocketUpgrade,
) -> Response {
    // Anonymous sessions are allowed; a bad token is not.
    let user_id = match params.token.as_deref().filter(|t| !t.is_empty()) {
        None => None,
        Some(token) => match state
            .auth
            .verify_access_token(token)
            .and_then(|claims| claims.user_id())
        {
            Ok(id) => Some(id),
            Err(e) => return ApiError::from(e).into_response(),
        },
    };

    ws.on_upgrade(move |socket| handle_socket(socket, state, user_id))
}

async fn handle_socket(socket: WebSocket, state: AppState, user_id: Option<ObjectId>) {
    let connection_id = Uuid::new_v4().to_string();
    info!(?user_id, %connection_id, "WebSocket connected");

    let (sender, mut receiver) = socket.split();
    let sender: WsSender = Arc::new(Mutex::new(sender));

    state.ws_storage.add(&connection_id, user_id);

    send(
        &sender,
        &ServerMessage::Connected {
            user_id: user_id.map(|id| id.to_hex()),
        },
    )
    .await;

    while let Some(msg) = receiver.next().await {
        match msg {
            Ok(Message::Text(text)) => {
                handle_client_message(&state, user_id, &connection_id, &sender, text.as_str()).await;
            }
            Ok(Message::Ping(data)) => {
                let mut guard = sender.lock().await;
                if guard.send(Message::Pong(data)).await.is_err() {
                    break;
                }
            }
            Ok(Message::Close(_)) => {
                break;
            }
            Err(e) => {
                warn!(?user_id, %connection_id, %e, "WebSocket error");
                break;
            }
            _ => {}
        }
    }

    let subscriptions = state.ws_storage.subscription_count(&connection_id);
    state.ws_storage.remove(&connection_id);
    info!(?user_id, %connection_id, subscriptions, "WebSocket disconnected");
}

async fn handle_client_message(
    state: &AppState,
    user_id: Option<ObjectId>,
    connection_id: &str,
    sender: &WsSender,
    text: &str,
) {
    let message: ClientMessage = match serde_json::from_str(text) {
        Ok(m) => m,
        Err(e) => {
            debug!(%connection_id, %e, "Malformed WS message");
            send(
                sender,
                &ServerMessage::Error {
                    message: format!("Malformed message: {e}"),
                },
            )
            .await;
            return;
        }
    };

    match message {
        ClientMessage::Ping => {
            send(sender, &ServerMessage::Pong).await;
        }
        ClientMessage::Sub { id, name, params } => {
            let publication = match Publication::from_parts(name, params) {
                Ok(p) => p,
                Err(error) => {
                    send(
                        sender,
                        &ServerMessage::Nosub {
                            id,
                            error: Some(error),
                        },
                    )
                    .await;
                    return;
                }
            };
            debug!(%connection_id, sub_id = %id, ?name, "Subscription started");

            let task = tokio::spawn(run_subscription(
                state.clone(),
                user_id,
                id.clone(),
                publication,
                sender.clone(),
            ));
            state
                .ws_storage
                .add_subscription(connection_id, id, task.abort_handle());
        }
        ClientMessage::Unsub { id } => {
            if state.ws_storage.remove_subscription(connection_id, &id) {
                debug!(%connection_id, sub_id = %id, "Subscription stopped");
                send(sender, &ServerMessage::Nosub { id, error: None }).await;
            }
        }
    }
}

/// Sends the initial snapshot, then re-runs the publication whenever the
/// viewer's feed changes and pushes what differs from the last snapshot.
async fn run_subscription(
    state: AppState,
    viewer: Option<ObjectId>,
    id: String,
    publication: Publication,
    sender: WsSender,
) {
    // Listen before the first query so no change slips between the two.
    let mut changes = state.events.subscribe();

    let mut current = match state.publications.run(viewer, &publication).await {
        Ok(data) => data,
        Err(e) => {
            warn!(sub_id = %id, %e, "Publication query failed");
            send(
                &sender,
                &ServerMessage::Nosub {
                    id,
                    error: Some(e.to_string()),
                },
            )
            .await;
            return;
        }
    };

    let ready = ServerMessage::Ready {
        id: id.clone(),
        data: current.clone(),
    };
    if !send(&sender, &ready).await {
        return;
    }

    // Nothing is ever published for anonymous viewers.
    let Some(viewer) = viewer else {
        return;
    };

    loop {
        match changes.recv().await {
            Ok(change) if change.user_id != viewer => continue,
            Ok(_) => {}
            Err(RecvError::Lagged(skipped)) => {
                debug!(sub_id = %id, skipped, "Feed change receiver lagged; re-running");
            }
            Err(RecvError::Closed) => break,
        }

        let next = match state.publications.run(Some(viewer), &publication).await {
            Ok(data) => data,
            Err(e) => {
                warn!(sub_id = %id, %e, "Publication re-run failed");
                continue;
            }
        };

        let update = match (&current, &next) {
            (PublicationData::Page(previous), PublicationData::Page(page)) => {
                let diff = FeedPageDiff::between(previous, page);
                (!diff.is_empty()).then(|| ServerMessage::Changed {
                    id: id.clone(),
                    diff,
                })
            }
            (PublicationData::Count { count: previous }, PublicationData::Count { count }) => {
                (previous != count).then(|| ServerMessage::Count {
                    id: id.clone(),
                    count: *count,
                })
            }
            _ => None,
        };
        current = next;

        if let Some(message) = update {
            if !send(&sender, &message).await {
                break;
            }
        }
    }
}
