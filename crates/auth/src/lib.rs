// Core modules
mod error;
mod password;
mod jwt;

// Sessions and persistence seams
pub mod model;
pub mod store;
pub mod memory;
pub mod service;

// Re-export error types
pub use error::{AuthError, Result, StoreError};

// Re-export crypto primitives (for standalone use without a store)
pub use password::{hash_password, verify_password};
pub use jwt::{generate_token, validate_token, Claims, TokenKind};

pub use model::{NewUser, RefreshTokenRecord, TokenPair, User, UserRecord};
pub use store::{lookup_hash, IdentityStore, SessionTokenStore, StoreResult};
pub use memory::MemoryStore;
pub use service::{SessionManager, TokenSettings};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{
        AuthError, Result,
        SessionManager, TokenSettings,
        IdentityStore, SessionTokenStore,
        User, TokenPair,
        Claims, TokenKind,
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_password_hashing() {
        let password = "test_password_123";
        let hash = hash_password(password).unwrap();

        assert!(verify_password(password, &hash));
        assert!(!verify_password("wrong_password", &hash));
    }

    #[test]
    fn test_jwt_token() {
        let secret = "test_secret_key_for_jwt";

        let token = generate_token(123, TokenKind::Access, secret, Duration::minutes(15)).unwrap();
        let claims = validate_token(&token, secret).unwrap();

        assert_eq!(claims.sub, "123");
        assert_eq!(claims.kind, TokenKind::Access);
    }
}
