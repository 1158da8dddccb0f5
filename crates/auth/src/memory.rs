//! In-process store backing both capabilities, for tests and single-node use.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;

use crate::error::StoreError;
use crate::model::{NewUser, RefreshTokenRecord, UserRecord};
use crate::store::{IdentityStore, SessionTokenStore, StoreResult};

#[derive(Default)]
struct Inner {
    users: HashMap<i64, UserRecord>,
    tokens: HashMap<String, RefreshTokenRecord>,
    next_user_id: i64,
    next_token_id: i64,
}

/// Hash-map backed implementation of [`IdentityStore`] and [`SessionTokenStore`].
///
/// Username and email uniqueness is enforced on insert, mirroring the UNIQUE
/// constraints of the SQL schema.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live refresh token records
    pub fn token_count(&self) -> usize {
        self.inner.lock().tokens.len()
    }
}

#[async_trait]
impl IdentityStore for MemoryStore {
    async fn create(&self, user: NewUser) -> StoreResult<UserRecord> {
        let mut inner = self.inner.lock();

        if inner
            .users
            .values()
            .any(|u| u.username == user.username || u.email == user.email)
        {
            return Err(StoreError::Conflict("users.username or users.email".into()));
        }

        inner.next_user_id += 1;
        let now = Utc::now();
        let record = UserRecord {
            id: inner.next_user_id,
            username: user.username,
            email: user.email,
            password_hash: user.password_hash,
            bio: String::new(),
            avatar_url: String::new(),
            created_at: now,
            updated_at: now,
        };
        inner.users.insert(record.id, record.clone());

        Ok(record)
    }

    async fn get_by_id(&self, id: i64) -> StoreResult<Option<UserRecord>> {
        Ok(self.inner.lock().users.get(&id).cloned())
    }

    async fn get_by_email(&self, email: &str) -> StoreResult<Option<UserRecord>> {
        Ok(self.inner.lock().users.values().find(|u| u.email == email).cloned())
    }

    async fn get_by_username(&self, username: &str) -> StoreResult<Option<UserRecord>> {
        Ok(self
            .inner
            .lock()
            .users
            .values()
            .find(|u| u.username == username)
            .cloned())
    }

    async fn update_bio(&self, id: i64, bio: &str) -> StoreResult<bool> {
        let mut inner = self.inner.lock();
        Ok(match inner.users.get_mut(&id) {
            Some(user) => {
                user.bio = bio.to_string();
                user.updated_at = Utc::now();
                true
            }
            None => false,
        })
    }

    async fn update_avatar(&self, id: i64, avatar_url: &str) -> StoreResult<bool> {
        let mut inner = self.inner.lock();
        Ok(match inner.users.get_mut(&id) {
            Some(user) => {
                user.avatar_url = avatar_url.to_string();
                user.updated_at = Utc::now();
                true
            }
            None => false,
        })
    }
}

#[async_trait]
impl SessionTokenStore for MemoryStore {
    async fn put(&self, user_id: i64, token_hash: &str, expires_at: DateTime<Utc>) -> StoreResult<()> {
        let mut inner = self.inner.lock();
        if inner.tokens.contains_key(token_hash) {
            return Err(StoreError::Conflict("refresh token hash already stored".into()));
        }
        inner.next_token_id += 1;
        let record = RefreshTokenRecord {
            id: inner.next_token_id,
            user_id,
            token_hash: token_hash.to_string(),
            expires_at,
            created_at: Utc::now(),
        };
        inner.tokens.insert(record.token_hash.clone(), record);
        Ok(())
    }

    async fn find_by_hash(&self, token_hash: &str) -> StoreResult<Option<RefreshTokenRecord>> {
        Ok(self.inner.lock().tokens.get(token_hash).cloned())
    }

    async fn consume(&self, token_hash: &str) -> StoreResult<Option<RefreshTokenRecord>> {
        Ok(self.inner.lock().tokens.remove(token_hash))
    }

    async fn delete_by_hash(&self, token_hash: &str) -> StoreResult<()> {
        self.inner.lock().tokens.remove(token_hash);
        Ok(())
    }

    async fn delete_all_for_user(&self, user_id: i64) -> StoreResult<u64> {
        let mut inner = self.inner.lock();
        let before = inner.tokens.len();
        inner.tokens.retain(|_, t| t.user_id != user_id);
        Ok((before - inner.tokens.len()) as u64)
    }
}
