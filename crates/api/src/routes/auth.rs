use axum::{
    Json,
    extract::State,
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use socium_db::models::User;
use socium_services::{auth::TokenPair, dao::user::ProfileUpdate};
use validator::Validate;

use crate::{error::ApiError, extractors::auth::AuthUser, state::AppState};

#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 3, max = 32))]
    pub username: String,
    #[validate(length(min = 1, max = 64))]
    pub display_name: String,
    #[validate(length(min = 8))]
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_in: u64,
    pub user: UserResponse,
}

#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: String,
    pub email: String,
    pub username: String,
    pub display_name: String,
    pub avatar: Option<String>,
    pub about: Option<String>,
    pub notify_by_email: bool,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id.map(|id| id.to_hex()).unwrap_or_default(),
            email: user.email,
            username: user.username,
            display_name: user.display_name,
            avatar: user.avatar,
            about: user.about,
            notify_by_email: user.notification_preferences.email,
        }
    }
}

/// `login` is either a username or an email address.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub login: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateProfileRequest {
    #[validate(length(min = 1, max = 64))]
    pub display_name: Option<String>,
    #[validate(url)]
    pub avatar: Option<String>,
    #[validate(length(max = 500))]
    pub about: Option<String>,
    pub notify_by_email: Option<bool>,
}

impl From<UpdateProfileRequest> for ProfileUpdate {
    fn from(body: UpdateProfileRequest) -> Self {
        Self {
            display_name: body.display_name,
            avatar: body.avatar,
            about: body.about,
            notify_by_email: body.notify_by_email,
        }
    }
}

/// A freshly issued token pair: JSON body plus the `access_token` cookie.
pub struct Session {
    status: StatusCode,
    cookie: HeaderValue,
    body: AuthResponse,
}

impl Session {
    fn issue(state: &AppState, user: User) -> Result<Self, ApiError> {
        let user_id = user
            .id
            .ok_or_else(|| ApiError::Internal("User without id".to_string()))?;
        let TokenPair {
            access_token,
            refresh_token,
            expires_in,
        } = state.auth.generate_tokens(user_id, &user.username)?;

        let cookie = HeaderValue::from_str(&format!(
            "access_token={access_token}; HttpOnly; Path=/; SameSite=Lax; Max-Age={expires_in}"
        ))
        .map_err(|e| ApiError::Internal(e.to_string()))?;

        Ok(Self {
            status: StatusCode::OK,
            cookie,
            body: AuthResponse {
                access_token,
                refresh_token,
                expires_in,
                user: user.into(),
            },
        })
    }

    fn created(mut self) -> Self {
        self.status = StatusCode::CREATED;
        self
    }
}

impl IntoResponse for Session {
    fn into_response(self) -> Response {
        (
            self.status,
            [(header::SET_COOKIE, self.cookie)],
            Json(self.body),
        )
            .into_response()
    }
}

pub async fn register(
    State(state): State<AppState>,
    Json(body): Json<RegisterRequest>,
) -> Result<Session, ApiError> {
    body.validate()?;
    let password_hash = state.auth.hash_password(&body.password)?;

    let user = state
        .users
        .create(body.email, body.username, body.display_name, password_hash)
        .await?;
    tracing::info!(user_id = ?user.id, username = %user.username, "User registered");

    Ok(Session::issue(&state, user)?.created())
}

pub async fn login(
    State(state): State<AppState>,
    Json(body): Json<LoginRequest>,
) -> Result<Session, ApiError> {
    let invalid = || ApiError::Unauthorized("Invalid credentials".to_string());

    let lookup = if body.login.contains('@') {
        state.users.find_by_email(&body.login).await
    } else {
        state.users.find_by_username(&body.login).await
    };
    let user = lookup.map_err(|_| invalid())?;

    let verified = match user.password_hash.as_deref() {
        Some(hash) => state.auth.verify_password(&body.password, hash)?,
        None => false,
    };
    if !verified {
        return Err(invalid());
    }

    Session::issue(&state, user)
}

pub async fn logout() -> impl IntoResponse {
    [(
        header::SET_COOKIE,
        HeaderValue::from_static("access_token=; HttpOnly; Path=/; SameSite=Lax; Max-Age=0"),
    )]
}

pub async fn refresh(
    State(state): State<AppState>,
    Json(body): Json<RefreshRequest>,
) -> Result<Session, ApiError> {
    let claims = state.auth.verify_refresh_token(&body.refresh_token)?;
    let user = state.users.find_active(claims.user_id()?).await?;
    Session::issue(&state, user)
}

pub async fn me(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<UserResponse>, ApiError> {
    let user = state.users.find_active(auth.user_id).await?;
    Ok(Json(user.into()))
}

pub async fn update_me(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(body): Json<UpdateProfileRequest>,
) -> Result<Json<UserResponse>, ApiError> {
    body.validate()?;
    state.users.update_profile(auth.user_id, body.into()).await?;

    let user = state.users.find_active(auth.user_id).await?;
    Ok(Json(user.into()))
}
