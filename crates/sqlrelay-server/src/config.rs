//! Configuration management for the sqlrelay server.
//!
//! Configuration is layered from three sources:
//! 1. Default values (hardcoded)
//! 2. Configuration file (YAML)
//! 3. Environment variables (override)
//!
//! Environment variables take precedence over config file values, which take
//! precedence over defaults.
//!
//! # Example
//!
//! ```yaml
//! server:
//!   port: 8787
//! databases:
//!   main:
//!     url: "sqlite://data/main.db"
//!     secret: "change-me"
//! ```
//!
//! The same database can be declared from the environment alone:
//!
//! ```text
//! SQLRELAY_DATABASES__MAIN__URL=sqlite://data/main.db
//! SQLRELAY_DATABASES__MAIN__SECRET=change-me
//! ```
//!
//! Database names are matched exactly against the `database` field of a
//! request. Names written in the YAML file keep their case (`Orders` stays
//! `Orders`, and `SQLRELAY_DATABASES__ORDERS__SECRET` still overrides it).
//! Databases declared only through the environment get lowercase names.

use std::collections::BTreeMap;
use std::path::Path;

use config::{Config, ConfigError, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use sqlrelay_storage::SqliteConfig;

/// Environment variable prefix for all settings.
pub const ENV_PREFIX: &str = "SQLRELAY";

/// Server configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
pub struct ServerConfig {
    /// Server settings
    #[serde(default)]
    pub server: ServerSettings,

    /// Logging settings
    #[serde(default)]
    pub logging: LoggingSettings,

    /// Database bindings keyed by the name callers use in `database`
    #[serde(default)]
    pub databases: BTreeMap<String, DatabaseSettings>,
}

/// Server network settings.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct ServerSettings {
    /// Host to bind to
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to listen on
    #[serde(default = "default_port")]
    pub port: u16,

    /// Maximum request body size in bytes
    #[serde(default = "default_body_limit")]
    pub body_limit_bytes: usize,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            body_limit_bytes: default_body_limit(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8787
}

fn default_body_limit() -> usize {
    1024 * 1024
}

/// Logging settings.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct LoggingSettings {
    /// Log level: "trace", "debug", "info", "warn", "error"
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Use JSON format (true for production, false for development)
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// A single database binding.
#[derive(Clone, Deserialize, Serialize, PartialEq)]
pub struct DatabaseSettings {
    /// SQLite URL, e.g. `sqlite://data/main.db` or `sqlite::memory:`
    pub url: String,

    /// Shared secret callers must present. Without one, every request
    /// against this database is rejected.
    #[serde(default)]
    pub secret: Option<String>,

    /// Connection pool size
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    /// Connection timeout in seconds
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,

    /// Create the database file when missing
    #[serde(default = "default_true")]
    pub create_if_missing: bool,
}

// Keep secrets out of logs
impl std::fmt::Debug for DatabaseSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DatabaseSettings")
            .field("url", &self.url)
            .field("secret", &self.secret.as_ref().map(|_| "[REDACTED]"))
            .field("max_connections", &self.max_connections)
            .field("connect_timeout_secs", &self.connect_timeout_secs)
            .field("create_if_missing", &self.create_if_missing)
            .finish()
    }
}

impl DatabaseSettings {
    /// Engine configuration for this binding.
    pub fn sqlite_config(&self) -> SqliteConfig {
        SqliteConfig {
            database_url: self.url.clone(),
            max_connections: self.max_connections,
            connect_timeout_secs: self.connect_timeout_secs,
            create_if_missing: self.create_if_missing,
        }
    }
}

fn default_max_connections() -> u32 {
    4
}

fn default_connect_timeout() -> u64 {
    5
}

fn default_true() -> bool {
    true
}

/// Error type for configuration loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigLoadError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] ConfigError),

    #[error("configuration file not found: {path}")]
    FileNotFound { path: String },

    #[error("invalid configuration: {message}")]
    Invalid { message: String },

    #[error("failed to read configuration file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse configuration file: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl ServerConfig {
    /// Load configuration from a YAML file with environment variable overrides.
    ///
    /// Environment variables are prefixed with `SQLRELAY_` and use `__` as
    /// separator, e.g. `SQLRELAY_SERVER__PORT=9090` overrides `server.port`.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigLoadError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(ConfigLoadError::FileNotFound {
                path: path.display().to_string(),
            });
        }

        let config = Config::builder()
            .add_source(Config::try_from(&ServerConfig::default())?)
            .add_source(File::from(path).format(FileFormat::Yaml))
            .add_source(env_source())
            .build()?;

        let mut server_config: ServerConfig = config.try_deserialize()?;
        restore_database_names(&mut server_config, path)?;
        server_config.validate()?;

        Ok(server_config)
    }

    /// Load configuration from environment variables only.
    pub fn from_env() -> Result<Self, ConfigLoadError> {
        let config = Config::builder()
            .add_source(Config::try_from(&ServerConfig::default())?)
            .add_source(env_source())
            .build()?;

        let server_config: ServerConfig = config.try_deserialize()?;
        server_config.validate()?;

        Ok(server_config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigLoadError> {
        if self.server.port == 0 {
            return Err(invalid("server.port must be greater than 0"));
        }

        if self.server.body_limit_bytes == 0 {
            return Err(invalid("server.body_limit_bytes must be greater than 0"));
        }

        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.logging.level.to_lowercase().as_str()) {
            return Err(invalid(format!(
                "logging.level must be one of: {:?}, got: {}",
                valid_levels, self.logging.level
            )));
        }

        for (name, database) in &self.databases {
            // `:` is reserved for the `<name>:SECRET` registry key
            if name.trim().is_empty() || name.contains(':') {
                return Err(invalid(format!(
                    "database name '{name}' must be non-empty and must not contain ':'"
                )));
            }
            if database.url.trim().is_empty() {
                return Err(invalid(format!("databases.{name}.url is required")));
            }
            if database.max_connections == 0 {
                return Err(invalid(format!(
                    "databases.{name}.max_connections must be greater than 0"
                )));
            }
        }

        Ok(())
    }
}

/// Database keys exactly as written in the YAML file.
#[derive(Debug, Default, Deserialize)]
struct FileDatabaseNames {
    #[serde(default)]
    databases: BTreeMap<String, serde_yaml::Value>,
}

/// Puts back the case of database names that `config` folded to lowercase.
fn restore_database_names(config: &mut ServerConfig, path: &Path) -> Result<(), ConfigLoadError> {
    let content = std::fs::read_to_string(path)?;
    let file = serde_yaml::from_str::<Option<FileDatabaseNames>>(&content)?.unwrap_or_default();

    let mut folded: BTreeMap<String, &str> = BTreeMap::new();
    for name in file.databases.keys() {
        if let Some(other) = folded.insert(name.to_lowercase(), name) {
            return Err(invalid(format!(
                "database names '{other}' and '{name}' differ only by case"
            )));
        }
    }

    for (lower, name) in folded {
        if lower == name {
            continue;
        }
        if let Some(settings) = config.databases.remove(&lower) {
            config.databases.insert(name.to_string(), settings);
        }
    }

    Ok(())
}

fn env_source() -> Environment {
    // SQLRELAY_SERVER__PORT -> server.port
    Environment::with_prefix(ENV_PREFIX)
        .prefix_separator("_")
        .separator("__")
}

fn invalid(message: impl Into<String>) -> ConfigLoadError {
    ConfigLoadError::Invalid {
        message: message.into(),
    }
}
