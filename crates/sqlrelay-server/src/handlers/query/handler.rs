//! Query handler implementation.

use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;
use sqlrelay_storage::{QueryResult, Row, RunResult};
use tracing::{debug, error, instrument, warn};

use super::command::{parse_body, Command, ExecutionMode};
use crate::error::{ProxyError, ProxyResult};
use crate::registry::BindingRegistry;

/// Engine-shaped result of one command, serialized as the `res` value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum QueryResponse {
    All(QueryResult),
    First(Option<Row>),
    Raw(Vec<Vec<Value>>),
    Run(RunResult),
}

/// Validates commands and executes them against the registry's databases.
///
/// Each call is independent: the only shared state is the read-only
/// registry.
#[derive(Debug, Clone)]
pub struct QueryHandler {
    registry: Arc<BindingRegistry>,
}

impl QueryHandler {
    /// Creates a handler over the given registry.
    pub fn new(registry: Arc<BindingRegistry>) -> Self {
        Self { registry }
    }

    /// Returns the registry the handler resolves databases from.
    pub fn registry(&self) -> &Arc<BindingRegistry> {
        &self.registry
    }

    /// Handles a raw POST body: parse, validate, then execute.
    pub async fn handle(&self, body: &[u8]) -> ProxyResult<QueryResponse> {
        let payload = parse_body(body);
        let command = Command::from_json(&payload).map_err(|e| {
            debug!(error = %e, "command rejected");
            e
        })?;
        self.execute(command).await
    }

    /// Executes a validated command.
    ///
    /// The database is resolved before the secret is checked, and nothing is
    /// prepared until the secret matches.
    #[instrument(skip_all, fields(database = %command.database, method = %command.method))]
    pub async fn execute(&self, command: Command) -> ProxyResult<QueryResponse> {
        let Some(database) = self.registry.database(&command.database) else {
            warn!("database not found");
            return Err(ProxyError::DatabaseNotFound {
                database: command.database,
            });
        };

        if !self
            .registry
            .verify_secret(&command.database, &command.secret)
        {
            warn!("invalid secret");
            return Err(ProxyError::InvalidSecret {
                database: command.database,
            });
        }

        let statement = database
            .prepare(&command.query)
            .await
            .and_then(|prepared| prepared.bind(&command.params))
            .map_err(|e| {
                error!(error = %e, "statement preparation failed");
                ProxyError::PrepareFailed(e)
            })?;

        debug!(params = command.params.len(), "executing statement");

        let response = match command.method {
            ExecutionMode::All => statement.all().await.map(QueryResponse::All),
            ExecutionMode::First => statement.first().await.map(QueryResponse::First),
            ExecutionMode::Raw => statement.raw().await.map(QueryResponse::Raw),
            ExecutionMode::Run => statement.run().await.map(QueryResponse::Run),
        };

        response.map_err(|e| {
            error!(error = %e, "statement execution failed");
            ProxyError::ExecuteFailed(e)
        })
    }
}
