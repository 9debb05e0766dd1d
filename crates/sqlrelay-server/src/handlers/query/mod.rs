//! Query handler: validation and dispatch of SQL commands.
//!
//! A request flows through the handler strictly in order:
//!
//! 1. **Parse**: body bytes to JSON, anything unparseable becomes `null`
//! 2. **Validate**: JSON to [`Command`], reporting the first bad field
//! 3. **Resolve**: `database` to a handle in the registry
//! 4. **Authenticate**: `secret` against `<database>:SECRET`
//! 5. **Prepare and bind**: compile `query`, bind `params` positionally
//! 6. **Execute**: dispatch on [`ExecutionMode`]
//!
//! Engine errors from steps 5 and 6 are kept apart as
//! [`ProxyError::PrepareFailed`](crate::error::ProxyError::PrepareFailed) and
//! [`ProxyError::ExecuteFailed`](crate::error::ProxyError::ExecuteFailed).

mod command;
mod handler;

pub use command::{parse_body, Command, ExecutionMode};
pub use handler::{QueryHandler, QueryResponse};
