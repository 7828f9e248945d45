//! Probe error types
//!
//! Structured errors for the rclone probes and the local directory walker.
//! Refresh cycles log these and continue with the next key; only a failed
//! remote listing aborts a whole cycle.

use std::io;
use std::process::ExitStatus;

/// Errors produced by the remote and local size probes
#[derive(Debug, thiserror::Error)]
pub enum ProbeError {
    #[error("failed to launch {tool}: {source}")]
    Launch {
        tool: String,
        #[source]
        source: io::Error,
    },

    #[error("{tool} failed ({status}): {stderr}")]
    Failed {
        tool: String,
        status: ExitStatus,
        stderr: String,
    },

    #[error("unreadable output from {tool}: {detail}")]
    Output { tool: String, detail: String },

    #[error("traversal failed at {path}: {source}")]
    Traversal {
        path: String,
        #[source]
        source: io::Error,
    },
}

impl ProbeError {
    /// Build a `Failed` error from a finished command's status and stderr
    pub fn from_output(tool: &str, status: ExitStatus, stderr: &[u8]) -> Self {
        ProbeError::Failed {
            tool: tool.to_string(),
            status,
            stderr: String::from_utf8_lossy(stderr).trim().to_string(),
        }
    }
}
