//! Pipeline entry points for crawler operations.
//!
//! - `GoalTreeCrawler`: depth-first traversal of the goal graph
//! - `run_crawl`: one-shot listing → crawl → snapshot run

pub mod crawl;
pub mod run;

pub use crawl::{CrawlPolicy, GoalTreeCrawler};
pub use run::run_crawl;
