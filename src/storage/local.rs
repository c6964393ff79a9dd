//! Local filesystem snapshot sink.
//!
//! ## Storage Layout
//!
//! ```text
//! {root}/
//! ├── stats.json                              # Latest run statistics
//! └── okrs/                                   # Snapshot prefix (configurable)
//!     ├── export-202608080900_processed.csv
//!     └── export-202608081500_processed.csv
//! ```
//!
//! Snapshots are immutable; every run adds a new file named after its batch
//! timestamp. Writes go to a temp file first and are renamed into place.

use std::path::PathBuf;

use async_trait::async_trait;
use chrono::Utc;
use serde::{Serialize, de::DeserializeOwned};
use tokio::io::AsyncWriteExt;

use crate::error::{AppError, Result};
use crate::models::{CrawlOutcome, CrawlStats};
use crate::storage::{SnapshotSink, WriteSummary, csv};

/// Local filesystem storage backend.
#[derive(Clone)]
pub struct LocalStorage {
    root_dir: PathBuf,
    prefix: String,
}

impl LocalStorage {
    /// Create a new LocalStorage rooted at the given directory.
    pub fn new(root_dir: impl Into<PathBuf>, prefix: impl Into<String>) -> Self {
        Self {
            root_dir: root_dir.into(),
            prefix: prefix.into(),
        }
    }

    /// Get the full path for a relative key.
    fn path(&self, key: &str) -> PathBuf {
        self.root_dir.join(key)
    }

    /// Snapshot key for a given batch timestamp.
    fn snapshot_key(&self, batch: &str) -> String {
        format!("{}/export-{}_processed.csv", self.prefix, batch)
    }

    /// Ensure parent directory exists.
    async fn ensure_dir(&self, path: &PathBuf) -> Result<()> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        Ok(())
    }

    /// Write bytes atomically (write to temp, then rename).
    async fn write_bytes(&self, key: &str, bytes: &[u8]) -> Result<()> {
        let path = self.path(key);
        self.ensure_dir(&path).await?;

        let tmp = path.with_extension("tmp");
        let mut file = tokio::fs::File::create(&tmp).await?;
        file.write_all(bytes).await?;
        file.flush().await?;
        drop(file);

        tokio::fs::rename(&tmp, &path).await?;
        Ok(())
    }

    /// Write JSON data.
    async fn write_json<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<()> {
        let bytes = serde_json::to_vec_pretty(value)?;
        self.write_bytes(key, &bytes).await
    }

    /// Read JSON data, returning None if the file doesn't exist.
    async fn read_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        let path = self.path(key);
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(AppError::Io(e)),
        }
    }

    /// Load the statistics of the most recent run, if any.
    pub async fn load_stats(&self) -> Result<Option<CrawlStats>> {
        self.read_json("stats.json").await
    }
}

#[async_trait]
impl SnapshotSink for LocalStorage {
    async fn write_snapshot(
        &self,
        outcome: &CrawlOutcome,
        stats: &CrawlStats,
    ) -> Result<WriteSummary> {
        let key = self.snapshot_key(&stats.batch);
        let content = csv::render_snapshot(&outcome.goals, &stats.batch);
        self.write_bytes(&key, content.as_bytes()).await?;

        self.write_json("stats.json", stats).await?;

        Ok(WriteSummary {
            snapshot_location: self.path(&key).display().to_string(),
            row_count: csv::row_count(&outcome.goals),
            timestamp: Utc::now(),
        })
    }
}
