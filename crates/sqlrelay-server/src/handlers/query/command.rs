//! Command schema and validation.

use std::fmt;
use std::str::FromStr;

use serde_json::{Map, Value};

use crate::error::{ProxyError, ProxyResult};

/// Path reported for errors about the body as a whole.
const BODY_PATH: &str = "body";

/// How the executed statement's outcome is shaped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExecutionMode {
    /// Every row plus metadata.
    All,
    /// The first row only.
    First,
    /// Rows as positional arrays.
    Raw,
    /// Metadata only.
    #[default]
    Run,
}

impl ExecutionMode {
    /// All modes, in the order they are reported in validation errors.
    pub const VALUES: [ExecutionMode; 4] = [
        ExecutionMode::All,
        ExecutionMode::First,
        ExecutionMode::Raw,
        ExecutionMode::Run,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ExecutionMode::All => "all",
            ExecutionMode::First => "first",
            ExecutionMode::Raw => "raw",
            ExecutionMode::Run => "run",
        }
    }

    /// `all|first|raw|run`
    fn expected() -> String {
        Self::VALUES
            .iter()
            .map(ExecutionMode::as_str)
            .collect::<Vec<_>>()
            .join("|")
    }
}

impl fmt::Display for ExecutionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExecutionMode {
    type Err = ProxyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::VALUES
            .into_iter()
            .find(|mode| mode.as_str() == s)
            .ok_or_else(|| {
                ProxyError::validation(
                    field_path("method"),
                    format!("Expected one of {}", Self::expected()),
                )
            })
    }
}

/// A validated request payload.
#[derive(Debug, Clone, PartialEq)]
pub struct Command {
    /// Caller-supplied credential.
    pub secret: String,
    /// Name of the database binding.
    pub database: String,
    /// SQL text.
    pub query: String,
    /// Positional bind parameters.
    pub params: Vec<Value>,
    /// Execution mode.
    pub method: ExecutionMode,
}

impl Command {
    /// Validates a parsed request body.
    ///
    /// Fields are checked in declaration order (`secret`, `database`,
    /// `query`, `params`, `method`) and the first problem is reported.
    /// Unknown fields are ignored.
    pub fn from_json(body: &Value) -> ProxyResult<Self> {
        let object = body
            .as_object()
            .ok_or_else(|| ProxyError::validation(BODY_PATH, expected_type("object", body)))?;

        let secret = required_string(object, "secret")?;
        let database = required_string(object, "database")?;
        let query = required_string(object, "query")?;
        let params = optional_array(object, "params")?;
        let method = match object.get("method") {
            None => ExecutionMode::default(),
            Some(Value::String(s)) => s.parse()?,
            Some(other) => {
                return Err(ProxyError::validation(
                    field_path("method"),
                    expected_type("string", other),
                ))
            }
        };

        Ok(Self {
            secret,
            database,
            query,
            params,
            method,
        })
    }
}

/// Parses a request body, mapping anything that is not JSON to `null`.
///
/// Empty and malformed bodies are not errors at this point; they fail schema
/// validation like any other non-object body.
pub fn parse_body(body: &[u8]) -> Value {
    serde_json::from_slice(body).unwrap_or(Value::Null)
}

fn field_path(name: &str) -> String {
    format!("{BODY_PATH}[{name}]")
}

fn required_string(object: &Map<String, Value>, name: &str) -> ProxyResult<String> {
    match object.get(name) {
        Some(Value::String(s)) => Ok(s.clone()),
        Some(other) => Err(ProxyError::validation(
            field_path(name),
            expected_type("string", other),
        )),
        None => Err(ProxyError::validation(field_path(name), "Required")),
    }
}

fn optional_array(object: &Map<String, Value>, name: &str) -> ProxyResult<Vec<Value>> {
    match object.get(name) {
        Some(Value::Array(values)) => Ok(values.clone()),
        Some(other) => Err(ProxyError::validation(
            field_path(name),
            expected_type("array", other),
        )),
        None => Ok(Vec::new()),
    }
}

fn expected_type(expected: &str, received: &Value) -> String {
    format!("Expected {expected}, received {}", type_name(received))
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
