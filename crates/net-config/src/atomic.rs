//! Atomic file replacement

use std::path::Path;

use sign_net_core::error::ConfigError;
use sign_net_core::Result;

/// Write `content` to `path` via a temporary file in the same directory
/// followed by a rename, so a crash mid-write cannot leave a truncated
/// configuration behind.
pub async fn store(path: &Path, content: &str) -> Result<()> {
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| ConfigError::Write {
            path: path.display().to_string(),
        })?;
    let temp = dir.join(format!(".{}.{}.tmp", name, std::process::id()));

    tokio::fs::write(&temp, content).await?;
    tokio::fs::rename(&temp, path).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_store_replaces_existing_content() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("dhcpcd.conf");

        store(&path, "first\n").await.unwrap();
        store(&path, "second\n").await.unwrap();

        let content = tokio::fs::read_to_string(&path).await.unwrap();
        assert_eq!(content, "second\n");

        // No temp files left behind
        let mut entries = tokio::fs::read_dir(dir.path()).await.unwrap();
        let mut count = 0;
        while let Some(_entry) = entries.next_entry().await.unwrap() {
            count += 1;
        }
        assert_eq!(count, 1);
    }
}
