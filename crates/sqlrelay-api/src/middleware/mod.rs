//! HTTP middleware.
//!
//! Request ids come from `tower-http`; this module adds per-request logging.

mod logging;

pub use logging::{RequestLoggingLayer, REQUEST_ID_HEADER};
