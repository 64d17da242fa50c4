use axum::{Json, extract::State, http::StatusCode};
use serde::{Deserialize, Serialize};
use socium_services::publication::ActionView;

use crate::{
    error::ApiError,
    extractors::{AuthUser, PathId},
    state::AppState,
};

#[derive(Debug, Deserialize)]
pub struct TextRequest {
    pub text: String,
}

#[derive(Debug, Deserialize)]
pub struct RateRequest {
    pub value: i32,
}

#[derive(Debug, Serialize)]
pub struct RemoveResponse {
    pub removed: usize,
}

pub async fn create(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(body): Json<TextRequest>,
) -> Result<(StatusCode, Json<ActionView>), ApiError> {
    let action = state.actions.create_post(auth.user_id, body.text).await?;
    let view = state.publications.action_view(action).await?;
    Ok((StatusCode::CREATED, Json(view)))
}

pub async fn get(
    State(state): State<AppState>,
    PathId(action_id): PathId,
) -> Result<Json<ActionView>, ApiError> {
    let action = state.actions.get(action_id).await?;
    Ok(Json(state.publications.action_view(action).await?))
}

pub async fn delete(
    State(state): State<AppState>,
    auth: AuthUser,
    PathId(action_id): PathId,
) -> Result<Json<RemoveResponse>, ApiError> {
    let removed = state.actions.remove(auth.user_id, action_id).await?;
    Ok(Json(RemoveResponse { removed }))
}

pub async fn comment(
    State(state): State<AppState>,
    auth: AuthUser,
    PathId(target_id): PathId,
    Json(body): Json<TextRequest>,
) -> Result<(StatusCode, Json<ActionView>), ApiError> {
    let action = state
        .actions
        .comment(auth.user_id, target_id, body.text)
        .await?;
    Ok((StatusCode::CREATED, Json(state.publications.action_view(action).await?)))
}

pub async fn rate(
    State(state): State<AppState>,
    auth: AuthUser,
    PathId(target_id): PathId,
    Json(body): Json<RateRequest>,
) -> Result<(StatusCode, Json<ActionView>), ApiError> {
    let action = state.actions.rate(auth.user_id, target_id, body.value).await?;
    Ok((StatusCode::CREATED, Json(state.publications.action_view(action).await?)))
}

pub async fn share(
    State(state): State<AppState>,
    auth: AuthUser,
    PathId(target_id): PathId,
) -> Result<(StatusCode, Json<ActionView>), ApiError> {
    let action = state.actions.share(auth.user_id, target_id).await?;
    Ok((StatusCode::CREATED, Json(state.publications.action_view(action).await?)))
}
