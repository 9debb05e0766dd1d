//! SQLite storage implementation.

use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use futures::TryStreamExt;
use serde_json::{Number, Value};
use sqlx::query::Query;
use sqlx::sqlite::{
    Sqlite, SqliteArguments, SqliteConnectOptions, SqliteConnection, SqlitePool, SqlitePoolOptions,
    SqliteRow,
};
use sqlx::{Column, Either, Executor, Row as _, Statement as _, TypeInfo, ValueRef};
use tracing::{debug, instrument};

use crate::error::{StorageError, StorageResult};
use crate::params::SqlParam;
use crate::traits::{
    BoundStatement, Database, PreparedStatement, QueryMeta, QueryResult, Row, RunResult,
};

/// Default connection timeout in seconds.
const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 5;

/// SQLite configuration options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SqliteConfig {
    /// Database URL, e.g. `sqlite://data/main.db` or `sqlite::memory:`.
    pub database_url: String,
    /// Maximum number of connections in the pool.
    ///
    /// Ignored for in-memory databases, which always use one connection.
    pub max_connections: u32,
    /// Connection timeout in seconds.
    pub connect_timeout_secs: u64,
    /// Create the database file when it does not exist.
    pub create_if_missing: bool,
}

impl Default for SqliteConfig {
    fn default() -> Self {
        Self {
            database_url: "sqlite::memory:".to_string(),
            max_connections: 4,
            connect_timeout_secs: DEFAULT_CONNECT_TIMEOUT_SECS,
            create_if_missing: true,
        }
    }
}

impl SqliteConfig {
    /// Configuration for a private in-memory database.
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// True when the URL points at an in-memory database.
    ///
    /// Each connection to `:memory:` opens a separate empty database, so
    /// these URLs are pinned to a single connection that is never recycled.
    pub fn is_in_memory(&self) -> bool {
        self.database_url.contains(":memory:") || self.database_url.contains("mode=memory")
    }
}

/// SQLite implementation of [`Database`].
#[derive(Clone)]
pub struct SqliteDatabase {
    pool: SqlitePool,
}

impl std::fmt::Debug for SqliteDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteDatabase")
            .field("size", &self.pool.size())
            .finish()
    }
}

impl SqliteDatabase {
    /// Opens a database from configuration.
    pub async fn from_config(config: &SqliteConfig) -> StorageResult<Self> {
        let options = SqliteConnectOptions::from_str(&config.database_url)
            .map_err(|e| StorageError::ConnectionError {
                message: format!("invalid database url: {e}"),
            })?
            .create_if_missing(config.create_if_missing);

        let mut pool_options = SqlitePoolOptions::new()
            .acquire_timeout(Duration::from_secs(config.connect_timeout_secs));

        pool_options = if config.is_in_memory() {
            pool_options
                .max_connections(1)
                .min_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            pool_options.max_connections(config.max_connections)
        };

        let pool = pool_options
            .connect_with(options)
            .await
            .map_err(|e| StorageError::ConnectionError {
                message: e.to_string(),
            })?;

        debug!(in_memory = config.is_in_memory(), "SQLite database opened");
        Ok(Self::from_pool(pool))
    }

    /// Wraps an existing pool.
    pub fn from_pool(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Returns the underlying pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

#[async_trait]
impl Database for SqliteDatabase {
    #[instrument(skip_all)]
    async fn prepare(&self, sql: &str) -> StorageResult<Box<dyn PreparedStatement>> {
        let statement = self
            .pool
            .prepare(sql)
            .await
            .map_err(|e| StorageError::PrepareError {
                message: e.to_string(),
            })?;

        let parameter_count = match statement.parameters() {
            Some(Either::Left(types)) => types.len(),
            Some(Either::Right(count)) => count,
            None => 0,
        };

        Ok(Box::new(SqlitePreparedStatement {
            pool: self.pool.clone(),
            sql: sql.to_string(),
            parameter_count,
        }))
    }
}

/// Statement compiled by SQLite, awaiting parameters.
struct SqlitePreparedStatement {
    pool: SqlitePool,
    sql: String,
    parameter_count: usize,
}

impl PreparedStatement for SqlitePreparedStatement {
    fn parameter_count(&self) -> usize {
        self.parameter_count
    }

    fn bind(self: Box<Self>, params: &[Value]) -> StorageResult<Box<dyn BoundStatement>> {
        if params.len() != self.parameter_count {
            return Err(StorageError::BindError {
                message: format!(
                    "statement expects {} parameters, got {}",
                    self.parameter_count,
                    params.len()
                ),
            });
        }

        let params = SqlParam::from_json_list(params)?;
        Ok(Box::new(SqliteBoundStatement {
            pool: self.pool,
            sql: self.sql,
            params,
        }))
    }
}

/// Statement with parameters bound.
struct SqliteBoundStatement {
    pool: SqlitePool,
    sql: String,
    params: Vec<SqlParam>,
}

/// Rows and accumulated metadata from one execution.
struct Execution {
    rows: Vec<SqliteRow>,
    meta: QueryMeta,
}

impl SqliteBoundStatement {
    fn query(&self) -> Query<'_, Sqlite, SqliteArguments<'_>> {
        self.params
            .iter()
            .fold(sqlx::query(&self.sql), |query, param| match param {
                SqlParam::Null => query.bind(None::<String>),
                SqlParam::Integer(v) => query.bind(*v),
                SqlParam::Real(v) => query.bind(*v),
                SqlParam::Text(v) => query.bind(v.clone()),
            })
    }

    /// Runs the statement to completion on a single connection.
    ///
    /// `changes` is the difference in the connection's `total_changes()`
    /// around the execution, so reads report zero and multi-statement text
    /// reports the sum over every statement. `last_row_id` is only reported
    /// when this execution moved the connection's `last_insert_rowid()`,
    /// and is 0 otherwise.
    async fn execute(&self) -> StorageResult<Execution> {
        let mut conn = self.pool.acquire().await.map_err(execute_error)?;
        let before = connection_counters(&mut conn).await?;

        let mut rows = Vec::new();
        {
            let mut stream = self.query().fetch_many(&mut *conn);
            while let Some(step) = stream.try_next().await.map_err(execute_error)? {
                if let Either::Right(row) = step {
                    rows.push(row);
                }
            }
        }

        let after = connection_counters(&mut conn).await?;
        let meta = QueryMeta {
            changes: after.total_changes.saturating_sub(before.total_changes) as u64,
            last_row_id: if after.last_insert_rowid != before.last_insert_rowid {
                after.last_insert_rowid
            } else {
                0
            },
            rows_read: rows.len() as u64,
        };
        debug!(rows = meta.rows_read, changes = meta.changes, "statement executed");
        Ok(Execution { rows, meta })
    }
}

/// Per-connection counters SQLite keeps across statements.
struct ConnectionCounters {
    total_changes: i64,
    last_insert_rowid: i64,
}

async fn connection_counters(conn: &mut SqliteConnection) -> StorageResult<ConnectionCounters> {
    let (total_changes, last_insert_rowid) =
        sqlx::query_as::<_, (i64, i64)>("SELECT total_changes(), last_insert_rowid()")
            .fetch_one(conn)
            .await
            .map_err(execute_error)?;
    Ok(ConnectionCounters {
        total_changes,
        last_insert_rowid,
    })
}

fn execute_error(e: sqlx::Error) -> StorageError {
    StorageError::ExecuteError {
        message: e.to_string(),
    }
}

#[async_trait]
impl BoundStatement for SqliteBoundStatement {
    #[instrument(skip_all)]
    async fn all(&self) -> StorageResult<QueryResult> {
        let Execution { rows, meta } = self.execute().await?;
        let results = rows.iter().map(row_to_object).collect::<StorageResult<_>>()?;
        Ok(QueryResult {
            results,
            success: true,
            meta,
        })
    }

    #[instrument(skip_all)]
    async fn first(&self) -> StorageResult<Option<Row>> {
        let Execution { rows, .. } = self.execute().await?;
        rows.first().map(row_to_object).transpose()
    }

    #[instrument(skip_all)]
    async fn raw(&self) -> StorageResult<Vec<Vec<Value>>> {
        let Execution { rows, .. } = self.execute().await?;
        rows.iter().map(row_to_array).collect()
    }

    #[instrument(skip_all)]
    async fn run(&self) -> StorageResult<RunResult> {
        let Execution { meta, .. } = self.execute().await?;
        Ok(RunResult {
            success: true,
            meta,
        })
    }
}

fn row_to_object(row: &SqliteRow) -> StorageResult<Row> {
    let mut object = Row::new();
    for (index, column) in row.columns().iter().enumerate() {
        object.insert(column.name().to_string(), column_value(row, index)?);
    }
    Ok(object)
}

fn row_to_array(row: &SqliteRow) -> StorageResult<Vec<Value>> {
    (0..row.columns().len())
        .map(|index| column_value(row, index))
        .collect()
}

/// Decodes one column by the storage class of its actual value.
fn column_value(row: &SqliteRow, index: usize) -> StorageResult<Value> {
    let decode_error = |e: sqlx::Error| StorageError::DecodeError {
        column: row
            .columns()
            .get(index)
            .map(|c| c.name().to_string())
            .unwrap_or_else(|| index.to_string()),
        message: e.to_string(),
    };

    let raw = row.try_get_raw(index).map_err(decode_error)?;
    if raw.is_null() {
        return Ok(Value::Null);
    }
    let storage_class = raw.type_info().name().to_string();

    let value = match storage_class.as_str() {
        "INTEGER" => Value::from(row.try_get_unchecked::<i64, _>(index).map_err(decode_error)?),
        "REAL" => {
            let v = row.try_get_unchecked::<f64, _>(index).map_err(decode_error)?;
            Number::from_f64(v).map(Value::Number).unwrap_or(Value::Null)
        }
        "BLOB" => {
            let bytes = row
                .try_get_unchecked::<Vec<u8>, _>(index)
                .map_err(decode_error)?;
            Value::Array(bytes.into_iter().map(Value::from).collect())
        }
        _ => Value::String(
            row.try_get_unchecked::<String, _>(index)
                .map_err(decode_error)?,
        ),
    };
    Ok(value)
}
