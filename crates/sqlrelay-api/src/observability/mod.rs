//! Logging setup.

mod logging;

pub use logging::{init_logging, parse_log_level, LoggingConfig};
