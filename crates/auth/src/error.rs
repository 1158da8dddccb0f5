use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AuthError {
    #[error("User already exists")]
    DuplicateIdentity,

    /// Unknown email and wrong password both map here.
    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Invalid token")]
    InvalidToken,

    #[error("Token expired")]
    TokenExpired,

    #[error("User not found")]
    UserNotFound,

    #[error("Token generation failed: {0}")]
    TokenGeneration(String),

    #[error("Password hashing failed: {0}")]
    HashingFailure(String),

    #[error("Storage failure: {0}")]
    StorageFailure(String),
}

impl AuthError {
    /// Whether the caller should be told "unauthorized" for this error.
    pub fn is_unauthorized(&self) -> bool {
        matches!(
            self,
            AuthError::InvalidCredentials | AuthError::InvalidToken | AuthError::TokenExpired
        )
    }
}

/// Errors surfaced by identity and session-token store adapters.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A uniqueness constraint was violated on insert.
    #[error("Unique constraint violated: {0}")]
    Conflict(String),

    #[error("Backend error: {0}")]
    Backend(String),
}

impl From<StoreError> for AuthError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Conflict(_) => AuthError::DuplicateIdentity,
            StoreError::Backend(msg) => AuthError::StorageFailure(msg),
        }
    }
}

pub type Result<T> = std::result::Result<T, AuthError>;
