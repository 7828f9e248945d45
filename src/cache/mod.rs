//! Size caching layer
//!
//! The snapshot-swapped stores that hold remote and local size entries,
//! plus the history log used to infer when a directory last changed.

pub mod history;
pub mod store;

pub use history::SizeHistory;
pub use store::{RefreshStatus, SizeCache, SizeEntry};
