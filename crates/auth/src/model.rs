use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Stored user row, including the password hash.
///
/// Never leaves the crate boundary towards clients; convert to [`User`] first.
#[derive(Debug, Clone)]
pub struct UserRecord {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub bio: String,
    pub avatar_url: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Public view of a user with the password hash stripped
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub bio: String,
    pub avatar_url: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<UserRecord> for User {
    fn from(record: UserRecord) -> Self {
        Self {
            id: record.id,
            username: record.username,
            email: record.email,
            bio: record.bio,
            avatar_url: record.avatar_url,
            created_at: record.created_at,
            updated_at: record.updated_at,
        }
    }
}

/// Input for creating a user
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password_hash: String,
}

impl NewUser {
    pub fn new(username: &str, email: &str, password_hash: String) -> Self {
        Self {
            username: username.to_string(),
            email: email.to_string(),
            password_hash,
        }
    }
}

/// Server-side record of an issued refresh token.
///
/// Only the SHA-256 lookup hash is stored, never the bearer string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshTokenRecord {
    pub id: i64,
    pub user_id: i64,
    pub token_hash: String,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl RefreshTokenRecord {
    pub fn is_expired(&self) -> bool {
        Utc::now() > self.expires_at
    }
}

/// Access + refresh token pair handed to clients
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn record() -> UserRecord {
        let now = Utc::now();
        UserRecord {
            id: 1,
            username: "alice".into(),
            email: "alice@x.com".into(),
            password_hash: "$argon2id$secret".into(),
            bio: String::new(),
            avatar_url: String::new(),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_user_from_record_drops_hash() {
        let user = User::from(record());

        assert_eq!(user.id, 1);
        assert_eq!(user.username, "alice");
        assert!(!format!("{user:?}").contains("argon2"));
    }

    #[test]
    fn test_refresh_record_expiry() {
        let now = Utc::now();
        let mut token = RefreshTokenRecord {
            id: 1,
            user_id: 1,
            token_hash: "abc".into(),
            expires_at: now + Duration::days(7),
            created_at: now,
        };
        assert!(!token.is_expired());

        token.expires_at = now - Duration::seconds(1);
        assert!(token.is_expired());
    }
}
