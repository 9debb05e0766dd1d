//! sqlrelay-storage: Database capability layer
//!
//! This crate provides the engine abstraction the proxy executes against:
//! - `Database` / `PreparedStatement` / `BoundStatement` capability traits
//! - Engine-shaped result types (`QueryResult`, `RunResult`, `QueryMeta`)
//! - SQLite implementation backed by sqlx
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │              sqlrelay-storage                │
//! ├─────────────────────────────────────────────┤
//! │  traits.rs  - prepare/bind/execute contract │
//! │  params.rs  - JSON to SQL parameter mapping │
//! │  sqlite.rs  - SQLite implementation         │
//! └─────────────────────────────────────────────┘
//! ```

pub mod error;
pub mod params;
pub mod sqlite;
pub mod traits;

// Re-export commonly used types
pub use error::{StorageError, StorageResult};
pub use params::SqlParam;
pub use sqlite::{SqliteConfig, SqliteDatabase};
pub use traits::{BoundStatement, Database, PreparedStatement, QueryMeta, QueryResult, Row, RunResult};
