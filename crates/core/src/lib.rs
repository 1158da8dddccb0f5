pub mod config;
pub use config::{AppConfig, AuthConfig, DatabaseConfig, LoggingConfig, ServerConfig};
