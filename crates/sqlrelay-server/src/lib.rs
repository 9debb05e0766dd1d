//! sqlrelay-server: Request handling and configuration
//!
//! This crate contains the proxy's business logic:
//! - Command schema and validation
//! - Binding registry (database handles and their secrets)
//! - Query handler: resolve, authenticate, prepare, bind, execute
//! - Configuration management
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │              sqlrelay-server                 │
//! ├─────────────────────────────────────────────┤
//! │  config.rs   - Configuration management     │
//! │  registry.rs - Named database bindings      │
//! │  error.rs    - Proxy error taxonomy         │
//! │  handlers/                                  │
//! │    query/    - Validation and dispatch      │
//! └─────────────────────────────────────────────┘
//! ```

pub mod config;
pub mod error;
pub mod handlers;
pub mod registry;

// Re-exports for convenience
pub use config::{ConfigLoadError, ServerConfig};
pub use error::{ErrorKind, ProxyError, ProxyResult};
pub use handlers::query::{Command, ExecutionMode, QueryHandler, QueryResponse};
pub use registry::{BindingRegistry, EnvValue};
