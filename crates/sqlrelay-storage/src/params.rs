//! JSON to SQL parameter conversion.

use serde_json::Value;

use crate::error::{StorageError, StorageResult};

/// A positional bind value.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlParam {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
}

impl SqlParam {
    /// Converts one JSON parameter.
    ///
    /// Booleans bind as 1/0. Numbers that fit in an i64 bind as integers,
    /// everything else numeric binds as a real. Arrays and objects have no
    /// SQL counterpart and are rejected.
    pub fn from_json(index: usize, value: &Value) -> StorageResult<Self> {
        match value {
            Value::Null => Ok(SqlParam::Null),
            Value::Bool(b) => Ok(SqlParam::Integer(i64::from(*b))),
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Ok(SqlParam::Integer(i))
                } else if let Some(f) = n.as_f64() {
                    Ok(SqlParam::Real(f))
                } else {
                    Err(StorageError::BindError {
                        message: format!("parameter {index} is not a representable number"),
                    })
                }
            }
            Value::String(s) => Ok(SqlParam::Text(s.clone())),
            Value::Array(_) => Err(StorageError::BindError {
                message: format!("parameter {index} is an array, which cannot be bound"),
            }),
            Value::Object(_) => Err(StorageError::BindError {
                message: format!("parameter {index} is an object, which cannot be bound"),
            }),
        }
    }

    /// Converts a full parameter list, failing on the first unbindable value.
    pub fn from_json_list(values: &[Value]) -> StorageResult<Vec<Self>> {
        values
            .iter()
            .enumerate()
            .map(|(index, value)| Self::from_json(index, value))
            .collect()
    }
}
