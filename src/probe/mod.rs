//! Size probes
//!
//! One probe per side of a comparison: rclone subprocess calls for remote
//! storage, a recursive filesystem walk for local directories.

pub mod errors;
pub mod local;
pub mod rclone;

pub use errors::ProbeError;
pub use rclone::{RcloneProbe, RemoteProbe};
