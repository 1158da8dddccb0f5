use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use rand_core::{OsRng, RngCore};
use serde::{Deserialize, Serialize};

use crate::error::{AuthError, Result};

/// Only HS256 is accepted; tokens advertising any other algorithm are rejected.
const ALGORITHM: Algorithm = Algorithm::HS256;

/// Bytes of entropy in a refresh token nonce.
const NONCE_BYTES: usize = 16;

/// What a bearer token may be used for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Access,
    Refresh,
}

/// JWT Claims structure
///
/// Unknown claims are ignored on decode so new fields can be added without
/// invalidating tokens already in circulation.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Subject (user ID)
    pub sub: String,
    /// Issued at (timestamp)
    pub iat: i64,
    /// Expiration time (timestamp)
    pub exp: i64,
    /// Token kind
    #[serde(rename = "type")]
    pub kind: TokenKind,
    /// Random nonce, present on refresh tokens
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jti: Option<String>,
}

impl Claims {
    /// Create new claims for `subject` valid for `ttl`.
    /// Refresh claims get a fresh random `jti`.
    pub fn new(subject: i64, kind: TokenKind, ttl: Duration) -> Self {
        let now = Utc::now();
        let expiration = now + ttl;

        Self {
            sub: subject.to_string(),
            iat: now.timestamp(),
            exp: expiration.timestamp(),
            kind,
            jti: (kind == TokenKind::Refresh).then(generate_nonce),
        }
    }

    /// Parse the subject back into a user ID
    pub fn subject_id(&self) -> Result<i64> {
        self.sub.parse().map_err(|_| AuthError::InvalidToken)
    }

    /// Check if the token is expired
    pub fn is_expired(&self) -> bool {
        Utc::now().timestamp() > self.exp
    }
}

fn generate_nonce() -> String {
    let mut bytes = [0u8; NONCE_BYTES];
    OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// Sign a token for a user
///
/// # Arguments
/// * `user_id` - The user identifier
/// * `kind` - Access or refresh
/// * `secret` - The secret key for signing the token
/// * `ttl` - How long the token stays valid
pub fn generate_token(user_id: i64, kind: TokenKind, secret: &str, ttl: Duration) -> Result<String> {
    let claims = Claims::new(user_id, kind, ttl);

    encode(
        &Header::new(ALGORITHM),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AuthError::TokenGeneration(e.to_string()))
}

/// Validate a JWT token and return the claims
///
/// Any signature, algorithm, expiry or claim-shape problem yields
/// `AuthError::InvalidToken`.
pub fn validate_token(token: &str, secret: &str) -> Result<Claims> {
    let mut validation = Validation::new(ALGORITHM);
    validation.leeway = 0;
    validation.set_required_spec_claims(&["exp", "iat", "sub"]);

    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )
    .map_err(|e| {
        tracing::debug!(reason = %e, "token rejected");
        AuthError::InvalidToken
    })?;

    let claims = token_data.claims;

    if claims.is_expired() {
        return Err(AuthError::InvalidToken);
    }
    claims.subject_id()?;

    Ok(claims)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hour() -> Duration {
        Duration::hours(1)
    }

    #[test]
    fn test_token_generation_and_validation() {
        let secret = "test_secret";

        let token = generate_token(123, TokenKind::Access, secret, hour()).unwrap();
        let claims = validate_token(&token, secret).unwrap();

        assert_eq!(claims.subject_id().unwrap(), 123);
        assert_eq!(claims.kind, TokenKind::Access);
        assert!(claims.jti.is_none());
        assert!(!claims.is_expired());
    }

    #[test]
    fn test_refresh_token_round_trip() {
        let secret = "test_secret";

        let token = generate_token(7, TokenKind::Refresh, secret, Duration::days(7)).unwrap();
        let claims = validate_token(&token, secret).unwrap();

        assert_eq!(claims.subject_id().unwrap(), 7);
        assert_eq!(claims.kind, TokenKind::Refresh);
        assert_eq!(claims.jti.as_deref().map(str::len), Some(NONCE_BYTES * 2));
    }

    #[test]
    fn test_invalid_secret() {
        let token = generate_token(123, TokenKind::Access, "correct_secret", hour()).unwrap();
        let result = validate_token(&token, "wrong_secret");

        assert_eq!(result.unwrap_err(), AuthError::InvalidToken);
    }

    #[test]
    fn test_expired_token() {
        let secret = "test_secret";

        // Create a token that expired a second ago
        let token = generate_token(123, TokenKind::Access, secret, Duration::seconds(-1)).unwrap();

        let result = validate_token(&token, secret);
        assert_eq!(result.unwrap_err(), AuthError::InvalidToken);
    }

    #[test]
    fn test_rejects_other_hmac_algorithm() {
        let secret = "test_secret";
        let claims = Claims::new(123, TokenKind::Access, hour());
        let token = encode(
            &Header::new(Algorithm::HS512),
            &claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap();

        assert_eq!(validate_token(&token, secret).unwrap_err(), AuthError::InvalidToken);
    }

    #[test]
    fn test_rejects_missing_kind() {
        #[derive(Serialize)]
        struct Bare {
            sub: String,
            iat: i64,
            exp: i64,
        }

        let secret = "test_secret";
        let now = Utc::now().timestamp();
        let bare = Bare { sub: "1".into(), iat: now, exp: now + 600 };
        let token = encode(&Header::new(ALGORITHM), &bare, &EncodingKey::from_secret(secret.as_bytes())).unwrap();

        assert_eq!(validate_token(&token, secret).unwrap_err(), AuthError::InvalidToken);
    }

    #[test]
    fn test_rejects_non_numeric_subject() {
        let secret = "test_secret";
        let mut claims = Claims::new(1, TokenKind::Access, hour());
        claims.sub = "alice".into();
        let token = encode(&Header::new(ALGORITHM), &claims, &EncodingKey::from_secret(secret.as_bytes())).unwrap();

        assert_eq!(validate_token(&token, secret).unwrap_err(), AuthError::InvalidToken);
    }

    #[test]
    fn test_ignores_unknown_claims() {
        #[derive(Serialize)]
        struct Extended {
            #[serde(flatten)]
            claims: Claims,
            scope: &'static str,
        }

        let secret = "test_secret";
        let extended = Extended { claims: Claims::new(42, TokenKind::Access, hour()), scope: "feed:read" };
        let token = encode(&Header::new(ALGORITHM), &extended, &EncodingKey::from_secret(secret.as_bytes())).unwrap();

        let claims = validate_token(&token, secret).unwrap();
        assert_eq!(claims.subject_id().unwrap(), 42);
    }

    #[test]
    fn test_garbage_is_rejected() {
        assert_eq!(validate_token("", "s").unwrap_err(), AuthError::InvalidToken);
        assert_eq!(validate_token("a.b.c", "s").unwrap_err(), AuthError::InvalidToken);
    }

    #[test]
    fn test_refresh_tokens_differ_within_same_second() {
        let secret = "test_secret";
        let first = generate_token(1, TokenKind::Refresh, secret, Duration::days(7)).unwrap();
        let second = generate_token(1, TokenKind::Refresh, secret, Duration::days(7)).unwrap();

        assert_ne!(first, second);
    }
}
