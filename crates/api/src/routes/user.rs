use axum::{
    Json,
    extract::{Query, State},
};
use serde::{Deserialize, Serialize};
use socium_db::models::User;
use socium_services::{action::SubscribeOutcome, publication::ActionView};

use crate::{
    error::ApiError,
    extractors::{AuthUser, MaybeAuthUser, PathId},
    state::AppState,
};

#[derive(Debug, Deserialize)]
pub struct LimitQuery {
    pub limit: Option<u32>,
}

#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    pub id: String,
    pub username: String,
    pub display_name: String,
    pub avatar: Option<String>,
    pub about: Option<String>,
    pub created_at: String,
}

impl From<User> for ProfileResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id.map(|id| id.to_hex()).unwrap_or_default(),
            username: user.username,
            display_name: user.display_name,
            avatar: user.avatar,
            about: user.about,
            created_at: user.created_at.try_to_rfc3339_string().unwrap_or_default(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct UserPage {
    pub items: Vec<ProfileResponse>,
    pub total: u64,
}

#[derive(Debug, Serialize)]
pub struct UserDetail {
    #[serde(flatten)]
    pub profile: ProfileResponse,
    pub subscriber_count: usize,
    /// Whether the caller is subscribed; `false` for anonymous callers.
    pub is_subscribed: bool,
}

#[derive(Debug, Serialize)]
pub struct SubscribeResponse {
    pub outcome: SubscribeOutcome,
    pub action_id: String,
}

/// Latest registered users and the total user count.
pub async fn list(
    State(state): State<AppState>,
    Query(params): Query<LimitQuery>,
) -> Result<Json<UserPage>, ApiError> {
    let limit = state.clamp_limit(params.limit);
    let users = state.users.recent(limit).await?;
    let total = state.users.count_active().await?;

    Ok(Json(UserPage {
        items: users.into_iter().map(ProfileResponse::from).collect(),
        total,
    }))
}

pub async fn get(
    State(state): State<AppState>,
    viewer: MaybeAuthUser,
    PathId(user_id): PathId,
) -> Result<Json<UserDetail>, ApiError> {
    let user = state
        .users
        .find_active(user_id)
        .await
        .map_err(|_| ApiError::NotFound("user-not-found".to_string()))?;
    let subscriber_count = state.actions.subscriber_count(user_id).await?;
    let is_subscribed = match viewer.user_id() {
        Some(me) if me != user_id => state.actions.is_subscribed(me, user_id).await?,
        _ => false,
    };

    Ok(Json(UserDetail {
        profile: user.into(),
        subscriber_count,
        is_subscribed,
    }))
}

/// The user's actions, newest first, with their joined data.
pub async fn actions(
    State(state): State<AppState>,
    PathId(user_id): PathId,
    Query(params): Query<LimitQuery>,
) -> Result<Json<Vec<ActionView>>, ApiError> {
    let limit = state.clamp_limit(params.limit);
    let actions = state.actions.list_by_author(user_id, limit).await?;
    let views = state.publications.action_views(actions).await?;
    Ok(Json(views))
}

pub async fn subscribe(
    State(state): State<AppState>,
    auth: AuthUser,
    PathId(target_user_id): PathId,
) -> Result<Json<SubscribeResponse>, ApiError> {
    let (outcome, action) = state.actions.subscribe(auth.user_id, target_user_id).await?;

    Ok(Json(SubscribeResponse {
        outcome,
        action_id: action.id.map(|id| id.to_hex()).unwrap_or_default(),
    }))
}
