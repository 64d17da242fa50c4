use axum::{
    extract::{FromRef, FromRequestParts},
    http::{header, request::Parts},
};
use bson::oid::ObjectId;

use crate::{error::ApiError, state::AppState};

/// Extracts the authenticated user from JWT (cookie or Authorization header)
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: ObjectId,
    pub username: String,
}

/// Like [`AuthUser`] but lets anonymous requests through as `None`.
/// A token that is present but invalid is still rejected.
#[derive(Debug, Clone)]
pub struct MaybeAuthUser(pub Option<AuthUser>);

impl MaybeAuthUser {
    pub fn user_id(&self) -> Option<ObjectId> {
        self.0.as_ref().map(|u| u.user_id)
    }
}

fn request_token(parts: &Parts) -> Option<String> {
    parts
        .headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(|s| s.to_string())
        .or_else(|| {
            parts
                .headers
                .get(header::COOKIE)
                .and_then(|v| v.to_str().ok())
                .and_then(|cookies| {
                    cookies.split(';').find_map(|cookie| {
                        cookie
                            .trim()
                            .strip_prefix("access_token=")
                            .filter(|s| !s.is_empty())
                            .map(|s| s.to_string())
                    })
                })
        })
}

fn authenticate(app_state: &AppState, token: &str) -> Result<AuthUser, ApiError> {
    let claims = app_state.auth.verify_access_token(token)?;
    let user_id = claims.user_id()?;
    Ok(AuthUser {
        user_id,
        username: claims.username,
    })
}

impl<S> FromRequestParts<S> for AuthUser
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let app_state = AppState::from_ref(state);
        let token = request_token(parts)
            .ok_or_else(|| ApiError::Unauthorized("not-authorized".to_string()))?;
        authenticate(&app_state, &token)
    }
}

impl<S> FromRequestParts<S> for MaybeAuthUser
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let app_state = AppState::from_ref(state);
        match request_token(parts) {
            Some(token) => Ok(MaybeAuthUser(Some(authenticate(&app_state, &token)?))),
            None => Ok(MaybeAuthUser(None)),
        }
    }
}
