//! Database capability traits.
//!
//! The proxy talks to every engine through the same three-step contract:
//!
//! ```text
//! Database::prepare(sql) -> PreparedStatement::bind(params) -> BoundStatement::{all, first, raw, run}
//! ```
//!
//! Each step consumes the previous one, so a statement that failed to prepare
//! or bind can never be executed.

use async_trait::async_trait;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::StorageResult;

/// A result row keyed by column name, in engine column order.
pub type Row = Map<String, Value>;

/// Execution metadata reported by the engine.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct QueryMeta {
    /// Rows inserted, updated or deleted.
    pub changes: u64,
    /// Row id of the most recent insert on the executing connection.
    pub last_row_id: i64,
    /// Rows returned by the statement.
    pub rows_read: u64,
}

/// Full result set returned by `all`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryResult {
    pub results: Vec<Row>,
    pub success: bool,
    pub meta: QueryMeta,
}

/// Outcome of `run`: metadata only, no row data.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunResult {
    pub success: bool,
    pub meta: QueryMeta,
}

/// A database handle able to compile SQL.
///
/// Implementations must be thread-safe (Send + Sync); a single handle is
/// shared by every concurrent request.
#[async_trait]
pub trait Database: Send + Sync + 'static {
    /// Compiles `sql` without running it.
    async fn prepare(&self, sql: &str) -> StorageResult<Box<dyn PreparedStatement>>;
}

/// A compiled statement waiting for its parameters.
pub trait PreparedStatement: Send + Sync {
    /// Number of positional placeholders in the statement.
    fn parameter_count(&self) -> usize;

    /// Binds positional parameters, one per placeholder.
    fn bind(self: Box<Self>, params: &[Value]) -> StorageResult<Box<dyn BoundStatement>>;
}

/// A statement with parameters bound, ready to run in one of four modes.
#[async_trait]
pub trait BoundStatement: Send + Sync {
    /// Runs the statement and returns every row plus metadata.
    async fn all(&self) -> StorageResult<QueryResult>;

    /// Runs the statement and returns the first row, if any.
    async fn first(&self) -> StorageResult<Option<Row>>;

    /// Runs the statement and returns rows as positional arrays.
    async fn raw(&self) -> StorageResult<Vec<Vec<Value>>>;

    /// Runs the statement for its effect and returns metadata only.
    async fn run(&self) -> StorageResult<RunResult>;
}
