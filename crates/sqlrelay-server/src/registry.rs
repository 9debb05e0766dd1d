//! Binding registry.
//!
//! The registry is the process-wide environment the handler resolves
//! databases from. It maps string keys to either plain text values or
//! database handles. A database named `D` is usable when `D` holds a handle
//! and `D:SECRET` holds the secret callers must present.
//!
//! The registry is built once at startup and shared read-only (`Arc`) by all
//! requests.

use std::collections::HashMap;
use std::sync::Arc;

use sqlrelay_storage::{Database, SqliteDatabase, StorageResult};
use subtle::ConstantTimeEq;
use tracing::{info, warn};

use crate::config::ServerConfig;

/// Suffix of the key holding a database's secret.
pub const SECRET_SUFFIX: &str = ":SECRET";

/// A value stored in the registry.
#[derive(Clone)]
pub enum EnvValue {
    /// Plain string (secrets and other settings).
    Text(String),
    /// A database handle.
    Database(Arc<dyn Database>),
}

impl std::fmt::Debug for EnvValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EnvValue::Text(_) => f.write_str("Text([REDACTED])"),
            EnvValue::Database(_) => f.write_str("Database(..)"),
        }
    }
}

/// Immutable map of named bindings.
#[derive(Debug, Clone, Default)]
pub struct BindingRegistry {
    entries: HashMap<String, EnvValue>,
}

/// Returns the registry key holding the secret for `database`.
pub fn secret_key(database: &str) -> String {
    format!("{database}{SECRET_SUFFIX}")
}

impl BindingRegistry {
    /// Starts an empty registry builder.
    pub fn builder() -> BindingRegistryBuilder {
        BindingRegistryBuilder::default()
    }

    /// Opens every configured database and registers it with its secret.
    pub async fn from_config(config: &ServerConfig) -> StorageResult<Self> {
        let mut builder = Self::builder();

        for (name, settings) in &config.databases {
            let database = SqliteDatabase::from_config(&settings.sqlite_config()).await?;
            builder = builder.database(name, Arc::new(database));

            match &settings.secret {
                Some(secret) => builder = builder.secret(name, secret),
                None => warn!(
                    database = %name,
                    "no secret configured; all requests for this database will be rejected"
                ),
            }
            info!(database = %name, "database binding registered");
        }

        Ok(builder.build())
    }

    /// Looks up a raw entry.
    pub fn get(&self, key: &str) -> Option<&EnvValue> {
        self.entries.get(key)
    }

    /// Resolves `name` to a database handle.
    ///
    /// Returns `None` when the entry is missing or holds plain text.
    pub fn database(&self, name: &str) -> Option<&Arc<dyn Database>> {
        match self.entries.get(name) {
            Some(EnvValue::Database(database)) => Some(database),
            _ => None,
        }
    }

    /// Returns the secret configured for `database`, if it is plain text.
    pub fn secret(&self, database: &str) -> Option<&str> {
        match self.entries.get(&secret_key(database)) {
            Some(EnvValue::Text(secret)) => Some(secret),
            _ => None,
        }
    }

    /// Checks a caller-supplied secret in constant time.
    ///
    /// A database without a configured secret never authenticates.
    pub fn verify_secret(&self, database: &str, candidate: &str) -> bool {
        match self.secret(database) {
            Some(expected) => expected.as_bytes().ct_eq(candidate.as_bytes()).into(),
            None => false,
        }
    }

    /// Number of registered entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Builder for [`BindingRegistry`].
#[derive(Debug, Default)]
pub struct BindingRegistryBuilder {
    entries: HashMap<String, EnvValue>,
}

impl BindingRegistryBuilder {
    /// Registers a database handle under `name`.
    pub fn database(mut self, name: impl Into<String>, database: Arc<dyn Database>) -> Self {
        self.entries
            .insert(name.into(), EnvValue::Database(database));
        self
    }

    /// Registers the secret for database `name` under `name:SECRET`.
    pub fn secret(mut self, name: &str, secret: impl Into<String>) -> Self {
        self.entries
            .insert(secret_key(name), EnvValue::Text(secret.into()));
        self
    }

    /// Registers an arbitrary plain text entry.
    pub fn text(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.entries.insert(key.into(), EnvValue::Text(value.into()));
        self
    }

    /// Finishes the registry.
    pub fn build(self) -> BindingRegistry {
        BindingRegistry {
            entries: self.entries,
        }
    }
}
