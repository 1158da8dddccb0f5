//! Relational persistence for identities and refresh tokens
//!
//! Provides:
//! - `SqliteStore`, implementing both `auth::IdentityStore` and
//!   `auth::SessionTokenStore` on a single SQLite database
//! - Schema creation with UNIQUE constraints on username, email and token hash
//! - Manual purge of expired refresh tokens

mod schema;
pub mod sqlite;

pub use sqlite::SqliteStore;
