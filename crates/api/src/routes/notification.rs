use axum::{Json, extract::State};

use crate::{
    error::ApiError,
    extractors::{MaybeAuthUser, PathId},
    state::AppState,
};

/// Deletes the caller's notification sourced from the given action.
pub async fn remove(
    State(state): State<AppState>,
    viewer: MaybeAuthUser,
    PathId(action_id): PathId,
) -> Result<Json<serde_json::Value>, ApiError> {
    state
        .feed
        .remove_notification(viewer.user_id(), action_id)
        .await?;
    Ok(Json(serde_json::json!({ "removed": true })))
}
