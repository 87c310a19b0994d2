//! Append-only operational log
//!
//! One line per invocation, written on success and failure alike. The log,
//! not the process exit status, is what answers "why did the sign go
//! offline" after the fact.

use std::path::Path;

use tokio::io::AsyncWriteExt;

use sign_net_core::error::SystemError;
use sign_net_core::Result;

/// Prefix `body` with a human-readable local timestamp.
pub fn line(body: &str) -> String {
    format!("[{}] {}", chrono::Local::now().format("%Y-%m-%d %H:%M:%S"), body)
}

/// Append one line to the log at `path`.
///
/// This is the one failure the appliers treat as fatal: an unwritable log
/// means the outcome of a mutation cannot be recorded anywhere.
pub async fn append(path: &Path, line: &str) -> Result<()> {
    let write_err = || SystemError::LogWrite {
        path: path.display().to_string(),
    };

    let mut file = tokio::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .await
        .map_err(|_| write_err())?;

    file.write_all(format!("{}\n", line).as_bytes())
        .await
        .map_err(|_| write_err())?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_append_creates_and_appends() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("signnet.log");

        append(&path, "first").await.unwrap();
        append(&path, "second").await.unwrap();

        let content = tokio::fs::read_to_string(&path).await.unwrap();
        assert_eq!(content, "first\nsecond\n");
    }

    #[tokio::test]
    async fn test_append_unwritable_path_is_fatal() {
        let result = append(Path::new("/nonexistent-dir/signnet.log"), "x").await;
        assert!(result.is_err());
    }

    #[test]
    fn test_line_has_timestamp_prefix() {
        let line = line("apply iface=eth0");
        assert!(line.starts_with('['));
        assert!(line.ends_with("] apply iface=eth0"));
    }
}
