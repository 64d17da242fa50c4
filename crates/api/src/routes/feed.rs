//! Feed publications as HTTP snapshots plus the feed RPC methods.

use axum::{
    Json,
    extract::{Query, State},
};
use bson::oid::ObjectId;
use serde::{Deserialize, Serialize};
use socium_db::models::ActionType;
use socium_services::publication::{FeedPage, FeedSelector};

use crate::{
    error::ApiError,
    extractors::{MaybeAuthUser, PathId},
    state::AppState,
};

/// A publication result as served over HTTP. Always complete, so `ready` is set.
#[derive(Debug, Serialize)]
pub struct Snapshot<T> {
    pub ready: bool,
    #[serde(flatten)]
    pub data: T,
}

impl<T> Snapshot<T> {
    fn ready(data: T) -> Json<Self> {
        Json(Self { ready: true, data })
    }
}

#[derive(Debug, Serialize)]
pub struct Count {
    pub count: u64,
}

#[derive(Debug, Deserialize)]
pub struct FeedQuery {
    pub is_notification: Option<bool>,
    pub is_read: Option<bool>,
    pub author_id: Option<String>,
    pub action_type: Option<ActionType>,
    pub limit: Option<u32>,
}

impl FeedQuery {
    fn selector(&self) -> Result<FeedSelector, ApiError> {
        let author_id = self
            .author_id
            .as_deref()
            .map(ObjectId::parse_str)
            .transpose()
            .map_err(|_| ApiError::BadRequest("Invalid author_id".to_string()))?;

        Ok(FeedSelector {
            is_notification: self.is_notification,
            is_read: self.is_read,
            author_id,
            action_type: self.action_type,
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct LimitQuery {
    pub limit: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct MarkReadRequest {
    pub ids: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct MarkReadResponse {
    pub updated: u64,
}

pub async fn feed_items(
    State(state): State<AppState>,
    viewer: MaybeAuthUser,
    Query(query): Query<FeedQuery>,
) -> Result<Json<Snapshot<FeedPage>>, ApiError> {
    let selector = query.selector()?;
    let page = state
        .publications
        .feed_items(viewer.user_id(), &selector, query.limit)
        .await?;
    Ok(Snapshot::ready(page))
}

pub async fn news(
    State(state): State<AppState>,
    viewer: MaybeAuthUser,
    Query(query): Query<LimitQuery>,
) -> Result<Json<Snapshot<FeedPage>>, ApiError> {
    let page = state.publications.news(viewer.user_id(), query.limit).await?;
    Ok(Snapshot::ready(page))
}

pub async fn notifications(
    State(state): State<AppState>,
    viewer: MaybeAuthUser,
    Query(query): Query<LimitQuery>,
) -> Result<Json<Snapshot<FeedPage>>, ApiError> {
    let page = state
        .publications
        .notifications(viewer.user_id(), query.limit)
        .await?;
    Ok(Snapshot::ready(page))
}

pub async fn unread_count(
    State(state): State<AppState>,
    viewer: MaybeAuthUser,
) -> Result<Json<Snapshot<Count>>, ApiError> {
    let count = state.publications.unread_count(viewer.user_id()).await?;
    Ok(Snapshot::ready(Count { count }))
}

pub async fn mark_read(
    State(state): State<AppState>,
    viewer: MaybeAuthUser,
    Json(body): Json<MarkReadRequest>,
) -> Result<Json<MarkReadResponse>, ApiError> {
    let ids = body
        .ids
        .iter()
        .map(|raw| {
            ObjectId::parse_str(raw).map_err(|_| ApiError::BadRequest(format!("Invalid id: {raw}")))
        })
        .collect::<Result<Vec<_>, _>>()?;

    let updated = state.feed.mark_read(viewer.user_id(), &ids).await?;
    Ok(Json(MarkReadResponse { updated }))
}

pub async fn remove(
    State(state): State<AppState>,
    viewer: MaybeAuthUser,
    PathId(feed_item_id): PathId,
) -> Result<Json<serde_json::Value>, ApiError> {
    state.feed.remove_item(viewer.user_id(), feed_item_id).await?;
    Ok(Json(serde_json::json!({ "removed": true })))
}
