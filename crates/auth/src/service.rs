use std::sync::Arc;

use chrono::{Duration, Utc};

use crate::{
    error::{AuthError, Result, StoreError},
    jwt::{generate_token, validate_token, TokenKind},
    model::{NewUser, TokenPair, User},
    password::{dummy_hash, dummy_verify, hash_password, verify_password},
    store::{lookup_hash, IdentityStore, SessionTokenStore},
};

/// Lifetimes of the two token kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenSettings {
    pub access_ttl: Duration,
    pub refresh_ttl: Duration,
}

impl Default for TokenSettings {
    fn default() -> Self {
        Self {
            access_ttl: Duration::minutes(15),
            refresh_ttl: Duration::days(7),
        }
    }
}

/// Session-token store failures are never identity conflicts.
fn storage_failure(err: StoreError) -> AuthError {
    AuthError::StorageFailure(err.to_string())
}

/// Registration, login and the refresh token lifecycle.
///
/// Holds no mutable state of its own; everything lives in the two stores,
/// so a single instance can serve concurrent requests.
pub struct SessionManager {
    identities: Arc<dyn IdentityStore>,
    sessions: Arc<dyn SessionTokenStore>,
    jwt_secret: String,
    settings: TokenSettings,
}

impl SessionManager {
    /// Create a new SessionManager
    ///
    /// # Arguments
    /// * `identities` - User persistence
    /// * `sessions` - Refresh token persistence
    /// * `jwt_secret` - Secret key for HS256 signing
    /// * `settings` - Access and refresh token lifetimes
    pub fn new(
        identities: Arc<dyn IdentityStore>,
        sessions: Arc<dyn SessionTokenStore>,
        jwt_secret: impl Into<String>,
        settings: TokenSettings,
    ) -> Self {
        // Pay the one-off hashing cost here rather than on the first unknown-email login.
        dummy_hash();
        Self {
            identities,
            sessions,
            jwt_secret: jwt_secret.into(),
            settings,
        }
    }

    /// Register a new user and issue a first token pair
    ///
    /// The username/email checks are two plain lookups and can race with a
    /// concurrent registration; stores with UNIQUE constraints report the
    /// loser as `DuplicateIdentity` anyway.
    pub async fn register(&self, username: &str, email: &str, password: &str) -> Result<(User, TokenPair)> {
        if self.identities.get_by_email(email).await?.is_some() {
            return Err(AuthError::DuplicateIdentity);
        }
        if self.identities.get_by_username(username).await?.is_some() {
            return Err(AuthError::DuplicateIdentity);
        }

        let password_hash = hash_password(password)?;
        let record = self
            .identities
            .create(NewUser::new(username, email, password_hash))
            .await?;

        let tokens = self.issue_tokens(record.id).await?;
        tracing::info!(user_id = record.id, "user registered");

        Ok((record.into(), tokens))
    }

    /// Login a user by email and password
    ///
    /// Unknown email and wrong password are indistinguishable to the caller.
    pub async fn login(&self, email: &str, password: &str) -> Result<(User, TokenPair)> {
        let Some(record) = self.identities.get_by_email(email).await? else {
            dummy_verify(password);
            tracing::warn!("login rejected");
            return Err(AuthError::InvalidCredentials);
        };

        if !verify_password(password, &record.password_hash) {
            tracing::warn!("login rejected");
            return Err(AuthError::InvalidCredentials);
        }

        let tokens = self.issue_tokens(record.id).await?;
        tracing::info!(user_id = record.id, "user logged in");

        Ok((record.into(), tokens))
    }

    /// Exchange a refresh token for a new pair.
    ///
    /// The presented token is consumed before the replacement is issued, so
    /// it can never be used twice and a failure in between forces a new login.
    pub async fn refresh(&self, refresh_token: &str) -> Result<TokenPair> {
        let hash = lookup_hash(refresh_token);

        let Some(stored) = self.sessions.consume(&hash).await.map_err(storage_failure)? else {
            tracing::warn!(reason = "unknown", "refresh rejected");
            return Err(AuthError::InvalidToken);
        };

        if stored.is_expired() {
            tracing::warn!(user_id = stored.user_id, reason = "expired", "refresh rejected");
            return Err(AuthError::TokenExpired);
        }

        let tokens = self.issue_tokens(stored.user_id).await?;
        tracing::info!(user_id = stored.user_id, "tokens rotated");

        Ok(tokens)
    }

    /// Revoke a refresh token. Unknown tokens are ignored.
    ///
    /// Access tokens already issued stay valid until they expire.
    pub async fn logout(&self, refresh_token: &str) -> Result<()> {
        self.sessions
            .delete_by_hash(&lookup_hash(refresh_token))
            .await
            .map_err(storage_failure)?;
        tracing::info!("refresh token revoked");
        Ok(())
    }

    /// Revoke every refresh token of a user
    pub async fn logout_all(&self, user_id: i64) -> Result<u64> {
        let revoked = self
            .sessions
            .delete_all_for_user(user_id)
            .await
            .map_err(storage_failure)?;
        tracing::info!(user_id, revoked, "all refresh tokens revoked");
        Ok(revoked)
    }

    /// Validate an access token and return its user ID.
    /// Does not touch storage.
    pub fn verify_access(&self, token: &str) -> Result<i64> {
        let claims = validate_token(token, &self.jwt_secret)?;

        if claims.kind != TokenKind::Access {
            tracing::debug!(kind = ?claims.kind, "non-access token presented");
            return Err(AuthError::InvalidToken);
        }

        claims.subject_id()
    }

    pub async fn get_user(&self, id: i64) -> Result<User> {
        self.identities
            .get_by_id(id)
            .await?
            .map(User::from)
            .ok_or(AuthError::UserNotFound)
    }

    pub async fn update_bio(&self, id: i64, bio: &str) -> Result<User> {
        if !self.identities.update_bio(id, bio).await? {
            return Err(AuthError::UserNotFound);
        }
        self.get_user(id).await
    }

    pub async fn update_avatar(&self, id: i64, avatar_url: &str) -> Result<User> {
        if !self.identities.update_avatar(id, avatar_url).await? {
            return Err(AuthError::UserNotFound);
        }
        self.get_user(id).await
    }

    /// Sign an access/refresh pair and persist the refresh token's hash.
    /// Nothing is returned unless the record was stored.
    async fn issue_tokens(&self, user_id: i64) -> Result<TokenPair> {
        let access_token = generate_token(user_id, TokenKind::Access, &self.jwt_secret, self.settings.access_ttl)?;
        let refresh_token = generate_token(user_id, TokenKind::Refresh, &self.jwt_secret, self.settings.refresh_ttl)?;

        let expires_at = Utc::now() + self.settings.refresh_ttl;
        self.sessions
            .put(user_id, &lookup_hash(&refresh_token), expires_at)
            .await
            .map_err(storage_failure)?;

        Ok(TokenPair {
            access_token,
            refresh_token,
        })
    }
}
