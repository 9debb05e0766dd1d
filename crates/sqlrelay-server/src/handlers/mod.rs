//! Request handlers.

pub mod query;
