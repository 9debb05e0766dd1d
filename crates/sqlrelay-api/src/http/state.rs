//! Application state for the HTTP handler.

use std::sync::Arc;

use sqlrelay_server::{BindingRegistry, QueryHandler};

/// State shared across requests.
///
/// Holds the query handler, which in turn owns the immutable binding
/// registry. Cloning is cheap.
#[derive(Clone)]
pub struct AppState {
    pub handler: Arc<QueryHandler>,
}

impl AppState {
    /// Creates state serving the given registry.
    pub fn new(registry: Arc<BindingRegistry>) -> Self {
        Self {
            handler: Arc::new(QueryHandler::new(registry)),
        }
    }

    pub fn registry(&self) -> &BindingRegistry {
        self.handler.registry()
    }
}
