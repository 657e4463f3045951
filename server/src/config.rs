//! Process configuration, read once from the environment at startup.
//!
//! `main` loads `.env` through `dotenvy`, builds one [`AppConfig`] and hands
//! it to whatever needs it. Unset and empty variables fall back to defaults.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use sqlx::postgres::{PgConnectOptions, PgSslMode};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value {value:?} for {key}: {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Production,
}

impl FromStr for Environment {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "development" => Ok(Environment::Development),
            "production" => Ok(Environment::Production),
            other => Err(format!("expected development or production, got {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageMode {
    Postgres,
    InMemory,
}

impl FromStr for StorageMode {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "postgres" => Ok(StorageMode::Postgres),
            "in_memory" => Ok(StorageMode::InMemory),
            other => Err(format!("expected postgres or in_memory, got {other}")),
        }
    }
}

#[derive(Clone)]
pub struct DatabaseConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub name: String,
    pub ssl_mode: PgSslMode,
    pub max_connections: u32,
    pub min_connections: u32,
}

// Hand-written so the password never reaches a log line.
impl fmt::Debug for DatabaseConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatabaseConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("name", &self.name)
            .field("ssl_mode", &self.ssl_mode)
            .field("max_connections", &self.max_connections)
            .field("min_connections", &self.min_connections)
            .finish_non_exhaustive()
    }
}

impl DatabaseConfig {
    pub fn connect_options(&self) -> PgConnectOptions {
        PgConnectOptions::new()
            .host(&self.host)
            .port(self.port)
            .username(&self.user)
            .password(&self.password)
            .database(&self.name)
            .ssl_mode(self.ssl_mode)
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: Environment,
    pub port: u16,
    pub storage_mode: StorageMode,
    pub request_timeout: Duration,
    pub database: DatabaseConfig,
    /// Per-OS application data directory. Computed for operators; nothing
    /// is stored there.
    pub data_dir: PathBuf,
    pub data_path: PathBuf,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.is_empty());
        let data_dir = default_data_dir(&get);

        Ok(Self {
            environment: parse_or(&get, "APP_ENV", Environment::Development)?,
            port: parse_or(&get, "PORT", 8080)?,
            storage_mode: parse_or(&get, "STORAGE_MODE", StorageMode::Postgres)?,
            request_timeout: Duration::from_secs(parse_or(&get, "REQUEST_TIMEOUT_SECS", 30)?),
            database: DatabaseConfig {
                host: get("DB_HOST").unwrap_or_else(|| "localhost".to_string()),
                port: parse_or(&get, "DB_PORT", 5432)?,
                user: get("DB_USER").unwrap_or_else(|| "postgres".to_string()),
                password: get("DB_PASSWORD").unwrap_or_default(),
                name: get("DB_NAME").unwrap_or_else(|| "todo_app".to_string()),
                ssl_mode: parse_or(&get, "DB_SSLMODE", PgSslMode::Disable)?,
                max_connections: parse_or(&get, "DB_MAX_CONNECTIONS", 25)?,
                min_connections: parse_or(&get, "DB_MIN_CONNECTIONS", 5)?,
            },
            data_path: data_dir.join("todos.db"),
            data_dir,
        })
    }

    /// Default `tracing` filter when `RUST_LOG` is not set.
    pub fn default_log_filter(&self) -> &'static str {
        match self.environment {
            Environment::Development => "todo_server=debug,tower_http=debug",
            Environment::Production => "todo_server=info,tower_http=warn",
        }
    }
}

fn parse_or<T, G>(get: &G, key: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: fmt::Display,
    G: Fn(&str) -> Option<String>,
{
    match get(key) {
        None => Ok(default),
        Some(value) => value.parse().map_err(|error: T::Err| ConfigError::Invalid {
            key,
            reason: error.to_string(),
            value,
        }),
    }
}

fn default_data_dir<G>(get: &G) -> PathBuf
where
    G: Fn(&str) -> Option<String>,
{
    if cfg!(target_os = "windows") {
        match get("APPDATA") {
            Some(app_data) => PathBuf::from(app_data).join("TodoApp"),
            None => PathBuf::from(get("USERPROFILE").unwrap_or_default())
                .join("AppData")
                .join("Roaming")
                .join("TodoApp"),
        }
    } else if cfg!(target_os = "android") {
        PathBuf::from("/data/data/com.yourapp.todo/files")
    } else if cfg!(target_os = "linux") {
        match get("XDG_DATA_HOME") {
            Some(xdg_data) => PathBuf::from(xdg_data).join("TodoApp"),
            None => PathBuf::from(get("HOME").unwrap_or_default())
                .join(".local")
                .join("share")
                .join("TodoApp"),
        }
    } else {
        PathBuf::from("./data")
    }
}
