//! Storage abstractions for snapshot persistence.
//!
//! One crawl run produces one timestamped CSV snapshot plus a `stats.json`
//! sidecar describing the run. The sink boundary is where this crate ends;
//! warehouse loading happens downstream of the written files.

pub mod csv;
pub mod local;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::Result;
use crate::models::{CrawlOutcome, CrawlStats};

// Re-export for convenience
pub use local::LocalStorage;

/// Metadata about a snapshot write.
#[derive(Debug, Clone)]
pub struct WriteSummary {
    /// Where the snapshot landed
    pub snapshot_location: String,
    /// Number of data rows written (header excluded)
    pub row_count: usize,
    /// Timestamp of the write
    pub timestamp: DateTime<Utc>,
}

/// Trait for snapshot sinks.
#[async_trait]
pub trait SnapshotSink: Send + Sync {
    /// Write one complete crawl snapshot and its run statistics.
    async fn write_snapshot(
        &self,
        outcome: &CrawlOutcome,
        stats: &CrawlStats,
    ) -> Result<WriteSummary>;
}
