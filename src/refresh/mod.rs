//! Refresh cycles and scheduling
//!
//! The snapshot-building cycles for both stores and the interval tasks
//! that trigger them. Non-overlap is enforced by the store's refresh flag,
//! claimed before any cycle runs.

pub mod local;
pub mod remote;
pub mod scheduler;

pub use local::LocalRefresher;
pub use remote::RemoteRefresher;
