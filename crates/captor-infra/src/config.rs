//! Configuration loader for Captor.
//!
//! Reads `config.toml` from the data directory (`~/.captor/` in production)
//! into [`AppConfig`], then applies environment overrides. A `.env` file in
//! the working directory is loaded first, so its values act as environment.

use std::path::{Path, PathBuf};

use captor_types::config::AppConfig;
use secrecy::SecretString;

/// Resolve the data directory.
///
/// Uses `CAPTOR_DATA_DIR` if set, otherwise `~/.captor`.
pub fn resolve_data_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("CAPTOR_DATA_DIR") {
        return PathBuf::from(dir);
    }

    if let Some(home) = dirs::home_dir() {
        return home.join(".captor");
    }

    PathBuf::from(".captor")
}

/// Load configuration: `.env`, then `{data_dir}/config.toml`, then
/// environment overrides.
///
/// A missing or malformed `config.toml` falls back to defaults.
pub async fn load_config(data_dir: &Path) -> AppConfig {
    if let Ok(path) = dotenvy::dotenv() {
        tracing::debug!("Loaded environment from {}", path.display());
    }

    let mut config = read_config_file(data_dir).await;
    apply_env_overrides(&mut config, |key| std::env::var(key).ok());
    config
}

async fn read_config_file(data_dir: &Path) -> AppConfig {
    let config_path = data_dir.join("config.toml");

    let content = match tokio::fs::read_to_string(&config_path).await {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!("No config.toml found at {}, using defaults", config_path.display());
            return AppConfig::default();
        }
        Err(err) => {
            tracing::warn!("Failed to read {}: {err}, using defaults", config_path.display());
            return AppConfig::default();
        }
    };

    match toml::from_str::<AppConfig>(&content) {
        Ok(config) => config,
        Err(err) => {
            tracing::warn!(
                "Failed to parse {}: {err}, using defaults",
                config_path.display()
            );
            AppConfig::default()
        }
    }
}

/// Apply `DATABASE_URL`, `SECRET_KEY`, `ACCESS_TOKEN_EXPIRE_MINUTES`,
/// `APP_NAME`, `CAPTOR_HOST`, and `CAPTOR_PORT` from `lookup`.
///
/// Unparseable numeric values are ignored with a warning.
pub fn apply_env_overrides(config: &mut AppConfig, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(url) = lookup("DATABASE_URL") {
        config.database.url = Some(url);
    }
    if let Some(key) = lookup("SECRET_KEY") {
        config.auth.secret_key = SecretString::from(key);
    }
    if let Some(minutes) = lookup("ACCESS_TOKEN_EXPIRE_MINUTES") {
        match minutes.parse() {
            Ok(minutes) => config.auth.access_token_expire_minutes = minutes,
            Err(_) => tracing::warn!("Ignoring invalid ACCESS_TOKEN_EXPIRE_MINUTES={minutes}"),
        }
    }
    if let Some(name) = lookup("APP_NAME") {
        config.app_name = name;
    }
    if let Some(host) = lookup("CAPTOR_HOST") {
        config.server.host = host;
    }
    if let Some(port) = lookup("CAPTOR_PORT") {
        match port.parse() {
            Ok(port) => config.server.port = port,
            Err(_) => tracing::warn!("Ignoring invalid CAPTOR_PORT={port}"),
        }
    }
}

/// The configured database URL, or `sqlite://{data_dir}/captor.db?mode=rwc`.
pub fn database_url(config: &AppConfig, data_dir: &Path) -> String {
    config.database.url.clone().unwrap_or_else(|| {
        format!("sqlite://{}?mode=rwc", data_dir.join("captor.db").display())
    })
}
