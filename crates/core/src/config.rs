use auth::TokenSettings;
use chrono::Duration;
use config::{Config, ConfigError, File};
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    #[serde(default)]
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    #[serde(default = "default_database_path")]
    pub path: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
    #[serde(default = "default_access_ttl")]
    pub access_ttl_seconds: i64,
    #[serde(default = "default_refresh_ttl")]
    pub refresh_ttl_seconds: i64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    /// `EnvFilter` directive, e.g. `info` or `auth=debug,info`
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_database_path() -> String {
    "sessionkit.db".to_string()
}

/// Upper bound for either token lifetime: one year.
const MAX_TTL_SECONDS: i64 = 365 * 24 * 3600;

fn default_access_ttl() -> i64 {
    15 * 60 // 15 minutes
}

fn default_refresh_ttl() -> i64 {
    7 * 24 * 3600 // 7 days
}

fn ttl(key: &str, seconds: i64) -> Result<Duration, ConfigError> {
    if !(1..=MAX_TTL_SECONDS).contains(&seconds) {
        return Err(ConfigError::Message(format!(
            "{key} must be between 1 and {MAX_TTL_SECONDS} seconds, got {seconds}"
        )));
    }
    Duration::try_seconds(seconds)
        .ok_or_else(|| ConfigError::Message(format!("{key} is out of range: {seconds}")))
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self { path: default_database_path() }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: default_log_level() }
    }
}

impl AuthConfig {
    /// Convert the configured lifetimes, rejecting values outside `1..=MAX_TTL_SECONDS`.
    pub fn token_settings(&self) -> Result<TokenSettings, ConfigError> {
        Ok(TokenSettings {
            access_ttl: ttl("auth.access_ttl_seconds", self.access_ttl_seconds)?,
            refresh_ttl: ttl("auth.refresh_ttl_seconds", self.refresh_ttl_seconds)?,
        })
    }
}

impl ServerConfig {
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl AppConfig {
    fn validated(self) -> Result<Self, ConfigError> {
        self.auth.token_settings()?;
        Ok(self)
    }

    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let config = Config::builder()
            .add_source(File::from(path.as_ref()))
            .build()?;

        config.try_deserialize::<Self>()?.validated()
    }

    /// Load configuration from sessionkit.toml in the current directory
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_file("sessionkit.toml")
    }

    /// Load configuration with environment variable overrides
    /// Environment variables are prefixed with SESSIONKIT_ and nest with `__`
    /// Example: SESSIONKIT_DATABASE__PATH, SESSIONKIT_AUTH__JWT_SECRET
    ///
    /// Returns the config and a list of environment variable overrides
    pub fn load_with_env() -> Result<(Self, Vec<String>), ConfigError> {
        let config = Config::builder()
            .add_source(File::with_name("sessionkit").required(false))
            .add_source(
                config::Environment::with_prefix("SESSIONKIT")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()?;

        // Detect which values were overridden by environment
        let env_vars = [
            ("SESSIONKIT_DATABASE__PATH", "database.path"),
            ("SESSIONKIT_AUTH__JWT_SECRET", "auth.jwt_secret"),
            ("SESSIONKIT_AUTH__ACCESS_TTL_SECONDS", "auth.access_ttl_seconds"),
            ("SESSIONKIT_AUTH__REFRESH_TTL_SECONDS", "auth.refresh_ttl_seconds"),
            ("SESSIONKIT_SERVER__HOST", "server.host"),
            ("SESSIONKIT_SERVER__PORT", "server.port"),
            ("SESSIONKIT_LOGGING__LEVEL", "logging.level"),
        ];

        let overrides = env_vars
            .into_iter()
            .filter(|(env_var, _)| std::env::var(env_var).is_ok())
            .map(|(_, config_key)| config_key.to_string())
            .collect();

        let app_config = config.try_deserialize::<Self>()?.validated()?;
        Ok((app_config, overrides))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_values() {
        assert_eq!(default_access_ttl(), 900);
        assert_eq!(default_refresh_ttl(), 604_800);
        assert_eq!(default_host(), "0.0.0.0");
        assert_eq!(default_port(), 8080);
        assert_eq!(default_log_level(), "info");
    }

    #[test]
    fn test_from_file_with_defaults() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "[auth]\njwt_secret = \"file-secret\"").unwrap();

        let config = AppConfig::from_file(file.path()).unwrap();

        assert_eq!(config.auth.jwt_secret, "file-secret");
        assert_eq!(config.database.path, "sessionkit.db");
        assert_eq!(config.server.bind_address(), "0.0.0.0:8080");
        assert_eq!(config.auth.token_settings().unwrap(), TokenSettings::default());
    }

    #[test]
    fn test_from_file_overrides() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            "[database]\npath = \":memory:\"\n\n[auth]\njwt_secret = \"s\"\naccess_ttl_seconds = 60\n\n[server]\nport = 9000\n\n[logging]\nlevel = \"debug\""
        )
        .unwrap();

        let config = AppConfig::from_file(file.path()).unwrap();

        assert_eq!(config.database.path, ":memory:");
        assert_eq!(config.auth.token_settings().unwrap().access_ttl, Duration::minutes(1));
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn test_missing_secret_is_an_error() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "[server]\nport = 9000").unwrap();

        assert!(AppConfig::from_file(file.path()).is_err());
    }

    #[test]
    fn test_rejects_out_of_range_ttls() {
        for (key, value) in [
            ("access_ttl_seconds", "0"),
            ("access_ttl_seconds", "-60"),
            ("refresh_ttl_seconds", "9223372036854775807"),
            ("refresh_ttl_seconds", "31536001"),
        ] {
            let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
            writeln!(file, "[auth]\njwt_secret = \"s\"\n{key} = {value}").unwrap();

            let err = AppConfig::from_file(file.path()).unwrap_err();
            assert!(err.to_string().contains(key), "{key} = {value}: {err}");
        }
    }

    #[test]
    fn test_token_settings_accepts_upper_bound() {
        let auth = AuthConfig {
            jwt_secret: "s".into(),
            access_ttl_seconds: 1,
            refresh_ttl_seconds: MAX_TTL_SECONDS,
        };

        let settings = auth.token_settings().unwrap();
        assert_eq!(settings.access_ttl, Duration::seconds(1));
        assert_eq!(settings.refresh_ttl, Duration::days(365));
    }
}
