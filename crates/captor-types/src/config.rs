//! Application configuration types for Captor.
//!
//! `AppConfig` represents `config.toml` in the data directory. Every section
//! and field has a default, so an empty or missing file yields a runnable
//! local configuration.

use secrecy::SecretString;
use serde::{Deserialize, Deserializer};

/// Top-level configuration.
#[derive(Debug, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_app_name")]
    pub app_name: String,

    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub database: DatabaseConfig,

    #[serde(default)]
    pub auth: AuthConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            app_name: default_app_name(),
            server: ServerConfig::default(),
            database: DatabaseConfig::default(),
            auth: AuthConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

fn default_app_name() -> String {
    "CAPTOR Backend".to_string()
}

/// HTTP listener settings.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8000
}

/// Database settings. `url` falls back to `{data_dir}/captor.db` when unset.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default)]
    pub url: Option<String>,
    /// Size of the read-only connection pool.
    #[serde(default = "default_max_readers")]
    pub max_readers: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: None,
            max_readers: default_max_readers(),
        }
    }
}

fn default_max_readers() -> u32 {
    8
}

/// Bearer token settings.
#[derive(Debug, Deserialize)]
pub struct AuthConfig {
    /// HS256 signing key for access tokens.
    #[serde(default = "default_secret_key", deserialize_with = "secret_string")]
    pub secret_key: SecretString,

    #[serde(default = "default_token_ttl")]
    pub access_token_expire_minutes: i64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            secret_key: default_secret_key(),
            access_token_expire_minutes: default_token_ttl(),
        }
    }
}

/// Development-only signing key; deployments must override it.
pub const DEFAULT_SECRET_KEY: &str = "super-secret-key-change-this-in-production";

fn default_secret_key() -> SecretString {
    SecretString::from(DEFAULT_SECRET_KEY)
}

fn default_token_ttl() -> i64 {
    60
}

fn secret_string<'de, D>(deserializer: D) -> Result<SecretString, D::Error>
where
    D: Deserializer<'de>,
{
    String::deserialize(deserializer).map(SecretString::from)
}

/// Log output settings. `RUST_LOG` takes precedence over `filter`.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_filter")]
    pub filter: String,
    /// Emit one JSON object per event instead of human-readable lines.
    #[serde(default)]
    pub json: bool,
    /// Export spans through OpenTelemetry (stdout exporter).
    #[serde(default)]
    pub otel: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: default_filter(),
            json: false,
            otel: false,
        }
    }
}

fn default_filter() -> String {
    "info".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;

    #[test]
    fn test_app_config_default_values() {
        let config = AppConfig::default();
        assert_eq!(config.app_name, "CAPTOR Backend");
        assert_eq!(config.server.port, 8000);
        assert!(config.database.url.is_none());
        assert_eq!(config.database.max_readers, 8);
        assert_eq!(config.auth.access_token_expire_minutes, 60);
        assert_eq!(config.auth.secret_key.expose_secret(), DEFAULT_SECRET_KEY);
    }

    #[test]
    fn test_app_config_from_toml() {
        let toml_str = r#"
app_name = "Captor Staging"

[server]
port = 9090

[database]
max_readers = 2

[auth]
secret_key = "s3cr3t"
access_token_expire_minutes = 15

[logging]
json = true
"#;
        let config: AppConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.app_name, "Captor Staging");
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 9090);
        assert_eq!(config.database.max_readers, 2);
        assert!(config.database.url.is_none());
        assert_eq!(config.auth.secret_key.expose_secret(), "s3cr3t");
        assert_eq!(config.auth.access_token_expire_minutes, 15);
        assert!(config.logging.json);
        assert_eq!(config.logging.filter, "info");
    }

    #[test]
    fn test_app_config_empty_toml_uses_defaults() {
        let config: AppConfig = toml::from_str("").unwrap();
        assert_eq!(config.server.port, 8000);
        assert!(!config.logging.otel);
    }
}
