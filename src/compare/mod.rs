//! Comparison layer
//!
//! Turns a remote identifier and a local directory path into a sync
//! comparison backed by the two size caches.

pub mod engine;

pub use engine::{CacheMiss, CompareEngine, CompareError, CompareOutcome, Comparison};
