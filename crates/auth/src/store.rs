//! Storage capabilities consumed by [`crate::SessionManager`].
//!
//! Lookups return `Ok(None)` for "not found"; `Err` is reserved for backend
//! failures and constraint violations.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};

use crate::error::StoreError;
use crate::model::{NewUser, RefreshTokenRecord, UserRecord};

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Persistence for user identities
#[async_trait]
pub trait IdentityStore: Send + Sync {
    /// Insert a user. Adapters that enforce uniqueness return
    /// `StoreError::Conflict` when the username or email is taken.
    async fn create(&self, user: NewUser) -> StoreResult<UserRecord>;

    async fn get_by_id(&self, id: i64) -> StoreResult<Option<UserRecord>>;

    async fn get_by_email(&self, email: &str) -> StoreResult<Option<UserRecord>>;

    async fn get_by_username(&self, username: &str) -> StoreResult<Option<UserRecord>>;

    /// Returns `false` when no user has this id.
    async fn update_bio(&self, id: i64, bio: &str) -> StoreResult<bool>;

    /// Returns `false` when no user has this id.
    async fn update_avatar(&self, id: i64, avatar_url: &str) -> StoreResult<bool>;
}

/// Persistence for refresh token records, keyed by lookup hash
#[async_trait]
pub trait SessionTokenStore: Send + Sync {
    async fn put(&self, user_id: i64, token_hash: &str, expires_at: DateTime<Utc>) -> StoreResult<()>;

    async fn find_by_hash(&self, token_hash: &str) -> StoreResult<Option<RefreshTokenRecord>>;

    /// Atomically delete the record and return it.
    ///
    /// Of several concurrent callers with the same hash at most one gets
    /// `Some`.
    async fn consume(&self, token_hash: &str) -> StoreResult<Option<RefreshTokenRecord>>;

    /// Deleting an unknown hash is not an error.
    async fn delete_by_hash(&self, token_hash: &str) -> StoreResult<()>;

    /// Returns the number of records removed.
    async fn delete_all_for_user(&self, user_id: i64) -> StoreResult<u64>;
}

/// SHA-256 hex digest of a bearer string, used as the storage key
pub fn lookup_hash(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}
