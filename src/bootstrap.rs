use anyhow::{Context, Result};
use std::path::Path;

use crate::state::AppState;
use crate::uploads::UploadKind;

/// Creates the data and upload directories. A directory that cannot be
/// created is logged and skipped; the server still starts.
pub async fn prepare_directories(state: &AppState) -> usize {
    let directories = [
        state.uploads.directory(UploadKind::News),
        state.uploads.directory(UploadKind::Gallery),
        state.uploads.incoming_dir(),
        state.records.data_dir().to_path_buf(),
    ];

    let mut failures = 0;
    for dir in &directories {
        if let Err(e) = ensure_dir(dir).await {
            tracing::error!("{:#}", e);
            failures += 1;
        }
    }

    failures
}

async fn ensure_dir(dir: &Path) -> Result<()> {
    tokio::fs::create_dir_all(dir)
        .await
        .with_context(|| format!("Failed to create directory {}", dir.display()))?;
    tracing::debug!(dir = %dir.display(), "Directory ready");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use clap::Parser;
    use tempfile::TempDir;

    #[tokio::test]
    async fn creates_every_directory() {
        let dir = TempDir::new().unwrap();
        let config = Config::try_parse_from([
            "server".into(),
            "--data-dir".into(),
            dir.path().join("data").into_os_string(),
            "--uploads-dir".into(),
            dir.path().join("uploads").into_os_string(),
        ])
        .unwrap();
        let state = AppState::new(&config);

        assert_eq!(prepare_directories(&state).await, 0);
        assert!(dir.path().join("data").is_dir());
        assert!(dir.path().join("uploads/news").is_dir());
        assert!(dir.path().join("uploads/gallery").is_dir());
        assert!(dir.path().join("uploads/.incoming").is_dir());
    }

    #[tokio::test]
    async fn failures_are_counted_not_fatal() {
        let dir = TempDir::new().unwrap();
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, b"not a directory").unwrap();

        let config = Config::try_parse_from([
            "server".into(),
            "--data-dir".into(),
            blocker.join("data").into_os_string(),
            "--uploads-dir".into(),
            dir.path().join("uploads").into_os_string(),
        ])
        .unwrap();
        let state = AppState::new(&config);

        assert_eq!(prepare_directories(&state).await, 1);
        assert!(dir.path().join("uploads/news").is_dir());
    }
}
