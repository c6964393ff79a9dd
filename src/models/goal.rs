//! Goal record structures.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A goal fetched from the directory, one record per unique key.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GoalNode {
    /// Stable textual identifier, unique per goal (e.g. "ACME-42")
    pub key: String,

    /// Goal display name
    pub name: String,

    /// Owner's display name, if any
    pub owner: Option<String>,

    /// Target date as reported by the API
    pub target_date: Option<String>,

    /// Start date as reported by the API
    pub start_date: Option<String>,

    /// Creation date as reported by the API
    pub creation_date: Option<String>,

    /// Key of the parent goal, if any
    pub parent_key: Option<String>,

    /// Direct sub-goals in API order
    pub subgoals: Vec<SubGoalRef>,

    /// Tag names
    pub tags: Vec<String>,

    /// Progress tracking type (e.g. "ATTACHED_METRIC")
    pub progress_type: Option<String>,

    /// Names of teams the goal belongs to
    pub teams: Vec<String>,

    /// Dot-separated organizational hierarchy path, if set
    pub lineage: Option<String>,

    /// Opaque external entity identifier
    pub entity_id: Option<String>,

    /// Whether the goal itself is archived
    pub archived: bool,
}

impl GoalNode {
    /// Placeholder record for a goal whose detail fetch failed outright.
    ///
    /// Everything except the key is absent, so every CSV column after the
    /// key serializes as `null`.
    pub fn placeholder(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            name: String::new(),
            owner: None,
            target_date: None,
            start_date: None,
            creation_date: None,
            parent_key: None,
            subgoals: Vec::new(),
            tags: Vec::new(),
            progress_type: None,
            teams: Vec::new(),
            lineage: None,
            entity_id: None,
            archived: false,
        }
    }

    /// Keys of sub-goals that are not archived, in API order.
    pub fn active_subgoal_keys(&self) -> impl DoubleEndedIterator<Item = &str> {
        self.subgoals
            .iter()
            .filter(|s| !s.archived)
            .map(|s| s.key.as_str())
    }
}

/// Reference to a direct sub-goal.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SubGoalRef {
    pub key: String,
    pub archived: bool,
}

/// An archived sub-goal that was reported but never fetched.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SkippedChild {
    /// Key of the archived sub-goal
    pub key: String,
    /// Key of the parent under which it was reported
    pub parent_key: String,
}

/// A goal whose detail fetch failed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FetchFailure {
    pub key: String,
    pub message: String,
}

/// Everything one crawl run produced.
#[derive(Debug, Default)]
pub struct CrawlOutcome {
    /// Number of keys a detail fetch was attempted for
    pub visited: usize,

    /// Goals in first-discovery (pre-order DFS) order
    pub goals: Vec<GoalNode>,

    /// Archived sub-goals reported by their parents, never fetched
    pub skipped_archived: Vec<SkippedChild>,

    /// Per-goal fetch failures
    pub failures: Vec<FetchFailure>,

    /// True when the crawl stopped early on repeated unauthorized fetches
    pub aborted: bool,
}

/// Statistics for a crawl run, persisted next to the snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlStats {
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    /// Batch timestamp shared by every row of the snapshot
    pub batch: String,
    pub root_count: usize,
    pub visited_count: usize,
    pub skipped_archived_count: usize,
    pub failure_count: usize,
    pub aborted: bool,
}
