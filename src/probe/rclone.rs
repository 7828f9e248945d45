//! rclone probe
//!
//! Shells out to the rclone binary to enumerate configured remotes and to
//! measure their total size. Probes carry no timeout: a slow remote only
//! delays the refresh cycle that probes it.

use async_trait::async_trait;
use serde::Deserialize;
use tokio::process::Command;
use tracing::debug;

use super::ProbeError;

/// Byte and object totals reported for one remote
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct RemoteSize {
    /// Total size in bytes
    pub bytes: u64,
    /// Number of objects
    pub count: u64,
}

/// Remote enumeration and sizing seam
///
/// The daemon talks to rclone through this trait so refresh cycles can be
/// exercised against in-memory fakes.
#[async_trait]
pub trait RemoteProbe: Send + Sync {
    /// List every configured remote identifier, e.g. `"gdrive:"`
    async fn list_remotes(&self) -> Result<Vec<String>, ProbeError>;

    /// Measure the total size of one remote
    async fn size(&self, remote: &str) -> Result<RemoteSize, ProbeError>;
}

/// Probe backed by the rclone command-line tool
pub struct RcloneProbe {
    /// Path or name of the rclone binary
    bin: String,
}

impl RcloneProbe {
    pub fn new(bin: impl Into<String>) -> Self {
        Self { bin: bin.into() }
    }

    /// Run rclone with the given arguments and return its stdout
    async fn run(&self, args: &[&str]) -> Result<Vec<u8>, ProbeError> {
        debug!(bin = %self.bin, args = ?args, "Running rclone");
        let output = Command::new(&self.bin)
            .args(args)
            .output()
            .await
            .map_err(|e| ProbeError::Launch {
                tool: self.bin.clone(),
                source: e,
            })?;

        if !output.status.success() {
            return Err(ProbeError::from_output(
                &self.bin,
                output.status,
                &output.stderr,
            ));
        }
        Ok(output.stdout)
    }
}

#[async_trait]
impl RemoteProbe for RcloneProbe {
    async fn list_remotes(&self) -> Result<Vec<String>, ProbeError> {
        let stdout = self.run(&["listremotes"]).await?;
        Ok(parse_remote_list(&String::from_utf8_lossy(&stdout)))
    }

    async fn size(&self, remote: &str) -> Result<RemoteSize, ProbeError> {
        let stdout = self.run(&["size", remote, "--json"]).await?;
        serde_json::from_slice(&stdout).map_err(|e| ProbeError::Output {
            tool: self.bin.clone(),
            detail: e.to_string(),
        })
    }
}

/// Split `rclone listremotes` output into remote identifiers
fn parse_remote_list(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_size_output() {
        let json = r#"{"count":4321,"bytes":1073741824}"#;
        let size: RemoteSize = serde_json::from_str(json).unwrap();
        assert_eq!(size.bytes, 1073741824);
        assert_eq!(size.count, 4321);
    }

    #[test]
    fn test_parse_size_output_ignores_extra_fields() {
        let json = r#"{"count":12,"bytes":2048,"sizeless":0}"#;
        let size: RemoteSize = serde_json::from_str(json).unwrap();
        assert_eq!(size.bytes, 2048);
    }

    #[test]
    fn test_parse_remote_list() {
        let remotes = parse_remote_list("gdrive:\ns3-backup:\n\n");
        assert_eq!(remotes, vec!["gdrive:".to_string(), "s3-backup:".to_string()]);
    }

    #[test]
    fn test_parse_remote_list_empty_output() {
        assert!(parse_remote_list("").is_empty());
        assert!(parse_remote_list("\n\n").is_empty());
    }
}
