// src/pipeline/run.rs

//! One-shot crawl driver.
//!
//! Wires the pieces together for a single scheduled run: list the root
//! goals, walk the graph, write the snapshot, report the run.

use chrono::Utc;

use crate::config::Credentials;
use crate::error::{AppError, Result};
use crate::models::{Config, CrawlStats};
use crate::pipeline::{CrawlPolicy, GoalTreeCrawler};
use crate::services::GoalDirectory;
use crate::storage::SnapshotSink;
use crate::utils::http;

/// Run one complete crawl and write its snapshot to `sink`.
///
/// A listing failure aborts before anything is written. A crawl aborted on
/// repeated unauthorized fetches still writes the partial snapshot, then
/// the error propagates so the process exits non-zero.
pub async fn run_crawl(
    config: &Config,
    credentials: &Credentials,
    sink: &dyn SnapshotSink,
) -> Result<CrawlStats> {
    let start_time = Utc::now();
    let batch = start_time.format("%Y%m%d%H%M").to_string();

    let client = http::create_client(&config.crawler, &config.api, credentials)?;
    let directory = GoalDirectory::new(config.api.clone(), client);

    let roots = directory.list_roots().await?;
    log::info!("Crawling {} root goals (batch {batch})", roots.len());

    let crawler = GoalTreeCrawler::new(&directory, CrawlPolicy::from(&config.crawler));
    let outcome = crawler.crawl(&roots).await?;

    let stats = CrawlStats {
        start_time,
        end_time: Utc::now(),
        batch,
        root_count: roots.len(),
        visited_count: outcome.visited,
        skipped_archived_count: outcome.skipped_archived.len(),
        failure_count: outcome.failures.len(),
        aborted: outcome.aborted,
    };

    let summary = sink.write_snapshot(&outcome, &stats).await?;

    log::info!(
        "Snapshot written to {} ({} rows)",
        summary.snapshot_location,
        summary.row_count
    );
    log::info!(
        "Visited {} goals: {} failures, {} archived sub-goals skipped — {}",
        stats.visited_count,
        stats.failure_count,
        stats.skipped_archived_count,
        if stats.aborted {
            "aborted early"
        } else {
            "completed"
        }
    );

    if stats.aborted {
        return Err(AppError::AuthExpired {
            consecutive: config.crawler.max_consecutive_auth_failures,
        });
    }

    Ok(stats)
}
