//! HTTP endpoint.
//!
//! A single handler serves every path:
//!
//! | Method | Response |
//! |--------|----------|
//! | `GET` | 200, plaintext greeting |
//! | `POST` | `{"res": ...}` or `{"err": ...}` |
//! | other | 405, `{"err": "Method must be POST"}` |

pub mod routes;
pub mod state;

pub use routes::{create_router, create_router_with_body_limit, DEFAULT_BODY_LIMIT, GREETING};
pub use state::AppState;
