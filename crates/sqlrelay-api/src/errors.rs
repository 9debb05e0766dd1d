//! Mapping of proxy errors to HTTP responses.
//!
//! [`ProxyError`] is protocol-agnostic; this module decides the status code
//! for each [`ErrorKind`] and renders the `{"err": ...}` envelope.
//!
//! | Kind | Status |
//! |------|--------|
//! | MethodNotAllowed | 405 |
//! | ValidationError | 400 |
//! | NotFound | 404 |
//! | Unauthorized | 401 |
//! | PrepareFailed | 500 |
//! | ExecuteFailed | 500 |

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use sqlrelay_server::{ErrorKind, ProxyError};

/// Returns the HTTP status for an error kind.
pub fn status_for(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
        ErrorKind::ValidationError => StatusCode::BAD_REQUEST,
        ErrorKind::NotFound => StatusCode::NOT_FOUND,
        ErrorKind::Unauthorized => StatusCode::UNAUTHORIZED,
        ErrorKind::PrepareFailed | ErrorKind::ExecuteFailed => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Failure envelope: `{"err": <message>}`.
#[derive(Debug, Serialize)]
pub struct ApiError {
    #[serde(skip)]
    pub status: StatusCode,
    pub err: String,
}

impl ApiError {
    pub fn new(status: StatusCode, err: impl Into<String>) -> Self {
        Self {
            status,
            err: err.into(),
        }
    }
}

impl From<ProxyError> for ApiError {
    fn from(err: ProxyError) -> Self {
        Self::new(status_for(err.kind()), err.client_message())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self)).into_response()
    }
}

/// Success envelope: `{"res": <value>}`.
#[derive(Debug, Serialize)]
pub struct ApiReply<T: Serialize> {
    pub res: T,
}

impl<T: Serialize> IntoResponse for ApiReply<T> {
    fn into_response(self) -> Response {
        (StatusCode::OK, Json(self)).into_response()
    }
}
