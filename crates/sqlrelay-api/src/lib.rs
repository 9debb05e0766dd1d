//! sqlrelay-api: HTTP API layer
//!
//! This crate provides the HTTP surface of the proxy:
//! - Method dispatch and `{res}` / `{err}` envelopes via Axum
//! - Error classification to HTTP status codes
//! - Middleware (request id, request logging)
//! - Structured logging setup
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │                sqlrelay-api                  │
//! ├─────────────────────────────────────────────┤
//! │  http/          - Router and handler        │
//! │  errors.rs      - Status code mapping       │
//! │  middleware/    - Request id, logging       │
//! │  observability/ - Logging subscriber        │
//! └─────────────────────────────────────────────┘
//! ```

pub mod errors;
pub mod http;
pub mod middleware;
pub mod observability;
