use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use auth::{IdentityStore, NewUser, RefreshTokenRecord, SessionTokenStore, StoreError, StoreResult, UserRecord};
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::schema;

const USER_COLUMNS: &str = "id, username, email, password_hash, bio, avatar_url, created_at, updated_at";
const TOKEN_COLUMNS: &str = "id, user_id, token_hash, expires_at, created_at";

/// SQLite-backed identity and refresh token store.
///
/// A single connection is shared behind a mutex; every query runs on the
/// blocking thread pool so async callers are never stalled by disk I/O.
#[derive(Clone)]
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    /// Open (or create) the database at `path` and apply the schema.
    pub fn open<P: AsRef<Path>>(path: P) -> StoreResult<Self> {
        let conn = Connection::open(path).map_err(map_error)?;
        Self::from_connection(conn)
    }

    /// Private database that lives as long as this store.
    pub fn in_memory() -> StoreResult<Self> {
        let conn = Connection::open_in_memory().map_err(map_error)?;
        Self::from_connection(conn)
    }

    fn from_connection(conn: Connection) -> StoreResult<Self> {
        schema::apply(&conn).map_err(map_error)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    async fn run<T, F>(&self, f: F) -> StoreResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> rusqlite::Result<T> + Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let conn = conn.lock();
            f(&conn)
        })
        .await
        .map_err(|e| StoreError::Backend(format!("blocking task failed: {e}")))?
        .map_err(map_error)
    }

    /// Delete refresh tokens that expired before `now`.
    ///
    /// Nothing calls this automatically; schedule it externally if stale rows matter.
    pub async fn purge_expired(&self, now: DateTime<Utc>) -> StoreResult<u64> {
        let cutoff = now.timestamp_millis();
        let deleted = self
            .run(move |conn| {
                conn.execute(
                    "DELETE FROM refresh_tokens WHERE expires_at < ?1",
                    params![cutoff],
                )
            })
            .await?;
        if deleted > 0 {
            tracing::info!(deleted, "purged expired refresh tokens");
        }
        Ok(deleted as u64)
    }
}

fn map_error(err: rusqlite::Error) -> StoreError {
    match err {
        rusqlite::Error::SqliteFailure(ref e, ref msg) if e.code == rusqlite::ErrorCode::ConstraintViolation => {
            StoreError::Conflict(msg.clone().unwrap_or_else(|| e.to_string()))
        }
        other => StoreError::Backend(other.to_string()),
    }
}

fn timestamp(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let millis: i64 = row.get(idx)?;
    DateTime::from_timestamp_millis(millis).ok_or(rusqlite::Error::IntegralValueOutOfRange(idx, millis))
}

fn user_from_row(row: &Row<'_>) -> rusqlite::Result<UserRecord> {
    Ok(UserRecord {
        id: row.get(0)?,
        username: row.get(1)?,
        email: row.get(2)?,
        password_hash: row.get(3)?,
        bio: row.get(4)?,
        avatar_url: row.get(5)?,
        created_at: timestamp(row, 6)?,
        updated_at: timestamp(row, 7)?,
    })
}

fn token_from_row(row: &Row<'_>) -> rusqlite::Result<RefreshTokenRecord> {
    Ok(RefreshTokenRecord {
        id: row.get(0)?,
        user_id: row.get(1)?,
        token_hash: row.get(2)?,
        expires_at: timestamp(row, 3)?,
        created_at: timestamp(row, 4)?,
    })
}

impl SqliteStore {
    async fn find_user(&self, column: &'static str, value: String) -> StoreResult<Option<UserRecord>> {
        self.run(move |conn| {
            conn.query_row(
                &format!("SELECT {USER_COLUMNS} FROM users WHERE {column} = ?1"),
                params![value],
                user_from_row,
            )
            .optional()
        })
        .await
    }

    async fn update_user_field(&self, id: i64, column: &'static str, value: String) -> StoreResult<bool> {
        let now = Utc::now().timestamp_millis();
        let updated = self
            .run(move |conn| {
                conn.execute(
                    &format!("UPDATE users SET {column} = ?1, updated_at = ?2 WHERE id = ?3"),
                    params![value, now, id],
                )
            })
            .await?;
        Ok(updated > 0)
    }
}

#[async_trait]
impl IdentityStore for SqliteStore {
    async fn create(&self, user: NewUser) -> StoreResult<UserRecord> {
        let now = Utc::now();
        let millis = now.timestamp_millis();
        let NewUser { username, email, password_hash } = user;

        self.run(move |conn| {
            conn.execute(
                "INSERT INTO users (username, email, password_hash, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?4)",
                params![username, email, password_hash, millis],
            )?;
            let created_at = DateTime::from_timestamp_millis(millis).unwrap_or(now);
            Ok(UserRecord {
                id: conn.last_insert_rowid(),
                username,
                email,
                password_hash,
                bio: String::new(),
                avatar_url: String::new(),
                created_at,
                updated_at: created_at,
            })
        })
        .await
    }

    async fn get_by_id(&self, id: i64) -> StoreResult<Option<UserRecord>> {
        self.run(move |conn| {
            conn.query_row(
                &format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1"),
                params![id],
                user_from_row,
            )
            .optional()
        })
        .await
    }

    async fn get_by_email(&self, email: &str) -> StoreResult<Option<UserRecord>> {
        self.find_user("email", email.to_string()).await
    }

    async fn get_by_username(&self, username: &str) -> StoreResult<Option<UserRecord>> {
        self.find_user("username", username.to_string()).await
    }

    async fn update_bio(&self, id: i64, bio: &str) -> StoreResult<bool> {
        self.update_user_field(id, "bio", bio.to_string()).await
    }

    async fn update_avatar(&self, id: i64, avatar_url: &str) -> StoreResult<bool> {
        self.update_user_field(id, "avatar_url", avatar_url.to_string()).await
    }
}

#[async_trait]
impl SessionTokenStore for SqliteStore {
    async fn put(&self, user_id: i64, token_hash: &str, expires_at: DateTime<Utc>) -> StoreResult<()> {
        let token_hash = token_hash.to_string();
        let expires_at = expires_at.timestamp_millis();
        let created_at = Utc::now().timestamp_millis();

        self.run(move |conn| {
            conn.execute(
                "INSERT INTO refresh_tokens (user_id, token_hash, expires_at, created_at)
                 VALUES (?1, ?2, ?3, ?4)",
                params![user_id, token_hash, expires_at, created_at],
            )
        })
        .await?;
        Ok(())
    }

    async fn find_by_hash(&self, token_hash: &str) -> StoreResult<Option<RefreshTokenRecord>> {
        let token_hash = token_hash.to_string();
        self.run(move |conn| {
            conn.query_row(
                &format!("SELECT {TOKEN_COLUMNS} FROM refresh_tokens WHERE token_hash = ?1"),
                params![token_hash],
                token_from_row,
            )
            .optional()
        })
        .await
    }

    async fn consume(&self, token_hash: &str) -> StoreResult<Option<RefreshTokenRecord>> {
        let token_hash = token_hash.to_string();
        // The row is removed by the first step of DELETE .. RETURNING, so
        // only one caller can ever read it back.
        self.run(move |conn| {
            conn.query_row(
                &format!("DELETE FROM refresh_tokens WHERE token_hash = ?1 RETURNING {TOKEN_COLUMNS}"),
                params![token_hash],
                token_from_row,
            )
            .optional()
        })
        .await
    }

    async fn delete_by_hash(&self, token_hash: &str) -> StoreResult<()> {
        let token_hash = token_hash.to_string();
        self.run(move |conn| {
            conn.execute(
                "DELETE FROM refresh_tokens WHERE token_hash = ?1",
                params![token_hash],
            )
        })
        .await?;
        Ok(())
    }

    async fn delete_all_for_user(&self, user_id: i64) -> StoreResult<u64> {
        let deleted = self
            .run(move |conn| {
                conn.execute(
                    "DELETE FROM refresh_tokens WHERE user_id = ?1",
                    params![user_id],
                )
            })
            .await?;
        Ok(deleted as u64)
    }
}
