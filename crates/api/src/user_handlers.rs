use axum::{extract::State, Json};
use auth::User;
use serde::Deserialize;
use std::sync::Arc;

use crate::{extract::JsonBody, middleware::AuthUser, ApiError, AppState};

#[derive(Debug, Deserialize)]
pub struct UpdateProfileRequest {
    pub bio: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateAvatarRequest {
    pub avatar_url: String,
}

/// GET /v1/users/me
pub async fn get_me(
    State(state): State<Arc<AppState>>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<User>, ApiError> {
    Ok(Json(state.sessions.get_user(user_id).await?))
}

/// PUT /v1/users/me
pub async fn update_profile(
    State(state): State<Arc<AppState>>,
    AuthUser(user_id): AuthUser,
    JsonBody(payload): JsonBody<UpdateProfileRequest>,
) -> Result<Json<User>, ApiError> {
    Ok(Json(state.sessions.update_bio(user_id, &payload.bio).await?))
}

/// PUT /v1/users/me/avatar
///
/// Takes a reference to an already-uploaded image; uploads are handled elsewhere.
pub async fn update_avatar(
    State(state): State<Arc<AppState>>,
    AuthUser(user_id): AuthUser,
    JsonBody(payload): JsonBody<UpdateAvatarRequest>,
) -> Result<Json<User>, ApiError> {
    if payload.avatar_url.is_empty() {
        return Err(ApiError::BadRequest("avatar_url is required".to_string()));
    }
    Ok(Json(state.sessions.update_avatar(user_id, &payload.avatar_url).await?))
}
