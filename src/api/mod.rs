//! HTTP surface
//!
//! JSON-over-HTTP control and query endpoints for the daemon, plus the
//! formatting helpers the payloads use.

pub mod format;
pub mod payloads;
pub mod routes;

pub use routes::{router, AppState};
