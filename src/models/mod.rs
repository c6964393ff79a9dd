// src/models/mod.rs

//! Domain models for the crawler application.
//!
//! This module contains all data structures used throughout the application,
//! organized by their primary purpose.

mod config;
mod goal;

// Re-export all public types
pub use config::{ApiConfig, Config, CrawlerConfig, FailedFetchPolicy, OutputConfig};
pub use goal::{CrawlOutcome, CrawlStats, FetchFailure, GoalNode, SkippedChild, SubGoalRef};
