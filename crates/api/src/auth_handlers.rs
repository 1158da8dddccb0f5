use axum::{
    extract::State,
    http::StatusCode,
    Json,
    response::IntoResponse,
};
use auth::{TokenPair, User};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::{extract::JsonBody, middleware::AuthUser, ApiError, AppState};

const MIN_PASSWORD_LEN: usize = 6;

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AuthResponse {
    pub user: User,
    pub tokens: TokenPair,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

/// POST /v1/auth/register
pub async fn register(
    State(state): State<Arc<AppState>>,
    JsonBody(payload): JsonBody<RegisterRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if payload.username.is_empty() || payload.email.is_empty() || payload.password.is_empty() {
        return Err(ApiError::BadRequest("username, email and password are required".to_string()));
    }
    if payload.password.len() < MIN_PASSWORD_LEN {
        return Err(ApiError::BadRequest(format!(
            "password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }

    let (user, tokens) = state
        .sessions
        .register(&payload.username, &payload.email, &payload.password)
        .await?;

    Ok((StatusCode::CREATED, Json(AuthResponse { user, tokens })))
}

/// POST /v1/auth/login
pub async fn login(
    State(state): State<Arc<AppState>>,
    JsonBody(payload): JsonBody<LoginRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    if payload.email.is_empty() || payload.password.is_empty() {
        return Err(ApiError::BadRequest("email and password are required".to_string()));
    }

    let (user, tokens) = state.sessions.login(&payload.email, &payload.password).await?;

    Ok(Json(AuthResponse { user, tokens }))
}

/// POST /v1/auth/refresh
pub async fn refresh(
    State(state): State<Arc<AppState>>,
    JsonBody(payload): JsonBody<RefreshRequest>,
) -> Result<Json<TokenPair>, ApiError> {
    if payload.refresh_token.is_empty() {
        return Err(ApiError::BadRequest("refresh_token is required".to_string()));
    }

    let tokens = state.sessions.refresh(&payload.refresh_token).await?;
    Ok(Json(tokens))
}

/// POST /v1/auth/logout
pub async fn logout(
    State(state): State<Arc<AppState>>,
    JsonBody(payload): JsonBody<RefreshRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    if payload.refresh_token.is_empty() {
        return Err(ApiError::BadRequest("refresh_token is required".to_string()));
    }

    state.sessions.logout(&payload.refresh_token).await?;
    Ok(Json(MessageResponse {
        message: "logged out".to_string(),
    }))
}

/// POST /v1/auth/logout-all
pub async fn logout_all(
    State(state): State<Arc<AppState>>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<MessageResponse>, ApiError> {
    let revoked = state.sessions.logout_all(user_id).await?;
    Ok(Json(MessageResponse {
        message: format!("revoked {revoked} sessions"),
    }))
}
