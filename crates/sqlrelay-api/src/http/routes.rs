//! HTTP routing and the dispatch handler.

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{rejection::BytesRejection, DefaultBodyLimit, State},
    http::{Method, StatusCode},
    response::{IntoResponse, Response},
    routing::any,
    Router,
};
use tower::ServiceBuilder;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tracing::debug;

use sqlrelay_server::ProxyError;

use super::state::AppState;
use crate::errors::{ApiError, ApiReply};
use crate::middleware::RequestLoggingLayer;

/// Default request body size limit (1MB).
pub const DEFAULT_BODY_LIMIT: usize = 1024 * 1024;

/// Plaintext body returned for `GET` on any path.
pub const GREETING: &str = "sqlrelay is running. POST a JSON command to execute a query.\n";

/// Creates the router with the default body size limit.
pub fn create_router(state: AppState) -> Router {
    create_router_with_body_limit(state, DEFAULT_BODY_LIMIT)
}

/// Creates the router with a custom body size limit.
///
/// Bodies over the limit are treated as unreadable and rejected with 400,
/// so clients always receive a JSON envelope.
///
/// # Arguments
///
/// * `state` - Application state with the binding registry
/// * `body_limit` - Maximum request body size in bytes
pub fn create_router_with_body_limit(state: AppState, body_limit: usize) -> Router {
    let shared_state = Arc::new(state);

    Router::new()
        .route("/", any(dispatch))
        .fallback(dispatch)
        .with_state(shared_state)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                .layer(RequestLoggingLayer::new())
                .layer(PropagateRequestIdLayer::x_request_id()),
        )
}

/// Serves every request, whatever its path.
async fn dispatch(
    State(state): State<Arc<AppState>>,
    method: Method,
    body: Result<Bytes, BytesRejection>,
) -> Response {
    match method {
        Method::GET => (StatusCode::OK, GREETING).into_response(),
        Method::POST => {
            let body = body.unwrap_or_else(|rejection| {
                debug!(error = %rejection, "request body could not be read");
                Bytes::new()
            });

            match state.handler.handle(&body).await {
                Ok(res) => ApiReply { res }.into_response(),
                Err(err) => ApiError::from(err).into_response(),
            }
        }
        other => ApiError::from(ProxyError::MethodNotAllowed {
            method: other.to_string(),
        })
        .into_response(),
    }
}
