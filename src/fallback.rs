//! Append-only JSON-lines file used when no database is configured.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::io::AsyncWriteExt;

use crate::error::FallbackError;

#[derive(Debug, Clone, Serialize)]
pub struct FallbackRecord {
    pub created_at: DateTime<Utc>,
    pub user_id: String,
    pub access_token: String,
    pub refresh_token: Option<String>,
}

impl FallbackRecord {
    pub fn new(user_id: &str, access_token: &str, refresh_token: Option<&str>) -> Self {
        Self {
            created_at: Utc::now(),
            user_id: user_id.to_string(),
            access_token: access_token.to_string(),
            refresh_token: refresh_token.map(str::to_string),
        }
    }
}

#[derive(Debug, Clone)]
pub struct FallbackWriter {
    path: PathBuf,
}

impl FallbackWriter {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one record as a single line, creating the file if needed.
    ///
    /// The line goes out in one `write_all` on an `O_APPEND` handle, so
    /// concurrent writers interleave whole lines only.
    pub async fn append(&self, record: &FallbackRecord) -> Result<(), FallbackError> {
        let mut line = serde_json::to_vec(record)?;
        line.push(b'\n');

        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        file.write_all(&line).await?;
        file.flush().await?;

        Ok(())
    }
}
