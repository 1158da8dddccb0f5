use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use auth::AuthError;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Handler error translated into a status code and JSON body
#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    Unauthorized(String),
    Auth(AuthError),
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        ApiError::Auth(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(message) => (StatusCode::BAD_REQUEST, message),
            ApiError::Unauthorized(message) => (StatusCode::UNAUTHORIZED, message),
            ApiError::Auth(err) => match err {
                AuthError::DuplicateIdentity => (StatusCode::CONFLICT, err.to_string()),
                AuthError::InvalidCredentials => (StatusCode::UNAUTHORIZED, err.to_string()),
                // Invalid and expired tokens share one message on purpose
                AuthError::InvalidToken | AuthError::TokenExpired => {
                    (StatusCode::UNAUTHORIZED, "Invalid or expired token".to_string())
                }
                AuthError::UserNotFound => (StatusCode::NOT_FOUND, err.to_string()),
                AuthError::TokenGeneration(_)
                | AuthError::HashingFailure(_)
                | AuthError::StorageFailure(_) => {
                    tracing::error!(error = %err, "request failed");
                    (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error".to_string())
                }
            },
        };

        (status, Json(ErrorResponse { error: message })).into_response()
    }
}
