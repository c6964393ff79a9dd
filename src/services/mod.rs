//! Service layer for the crawler application.
//!
//! This module contains the HTTP collaborators:
//! - Goal directory access (`GoalDirectory`)
//! - The `GoalFetcher` capability the traversal consumes

mod goals;

pub use goals::GoalDirectory;

use async_trait::async_trait;

use crate::error::Result;
use crate::models::GoalNode;

/// Capability to fetch a single goal's detail by key.
///
/// The traversal depends on this seam only; production code plugs in
/// [`GoalDirectory`], tests plug in scripted in-memory graphs.
#[async_trait]
pub trait GoalFetcher: Send + Sync {
    /// Fetch the detail record for `key`, including its direct sub-goal
    /// references and their archived flags.
    async fn fetch_detail(&self, key: &str) -> Result<GoalNode>;
}
