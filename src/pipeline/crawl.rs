// src/pipeline/crawl.rs

//! Depth-first traversal of the goal graph.
//!
//! Starting from the listed root keys, fetches each goal's detail, then the
//! details of its non-archived sub-goals, visiting every unique key exactly
//! once. The graph is treated as untrusted: a goal may hang off several
//! parents or even form a cycle, so a key is marked visited before its
//! fetch and never re-entered.

use std::collections::HashSet;
use std::time::Duration;

use tokio::time::Instant;

use crate::error::Result;
use crate::models::{
    CrawlOutcome, CrawlerConfig, FailedFetchPolicy, FetchFailure, GoalNode, SkippedChild,
};
use crate::services::GoalFetcher;

/// Traversal-level policy knobs.
#[derive(Debug, Clone)]
pub struct CrawlPolicy {
    /// Minimum interval between successive detail fetches
    pub min_fetch_interval: Duration,

    /// Consecutive unauthorized fetches tolerated before aborting
    pub max_consecutive_auth_failures: usize,

    /// Row policy for goals whose detail fetch returned nothing
    pub on_fetch_failure: FailedFetchPolicy,
}

impl Default for CrawlPolicy {
    fn default() -> Self {
        Self {
            min_fetch_interval: Duration::from_millis(300),
            max_consecutive_auth_failures: 3,
            on_fetch_failure: FailedFetchPolicy::Omit,
        }
    }
}

impl From<&CrawlerConfig> for CrawlPolicy {
    fn from(config: &CrawlerConfig) -> Self {
        Self {
            min_fetch_interval: Duration::from_millis(config.request_delay_ms),
            max_consecutive_auth_failures: config.max_consecutive_auth_failures,
            on_fetch_failure: config.on_fetch_failure,
        }
    }
}

/// Depth-first goal graph crawler.
///
/// Owns the visited-set and accumulator for exactly one run; a new crawl
/// starts from scratch. Strictly sequential: one detail fetch is in flight
/// at any time, spaced by the policy's minimum interval.
pub struct GoalTreeCrawler<'a, F: GoalFetcher> {
    fetcher: &'a F,
    policy: CrawlPolicy,
}

impl<'a, F: GoalFetcher> GoalTreeCrawler<'a, F> {
    pub fn new(fetcher: &'a F, policy: CrawlPolicy) -> Self {
        Self { fetcher, policy }
    }

    /// Crawl every goal reachable from `root_keys`.
    ///
    /// Pre-order: roots in the given order, each root's subtree fully
    /// explored before the next root, children in the order the fetch
    /// returned them. An empty `root_keys` yields an empty outcome.
    pub async fn crawl(&self, root_keys: &[String]) -> Result<CrawlOutcome> {
        let mut visited: HashSet<String> = HashSet::new();
        let mut outcome = CrawlOutcome::default();
        let mut consecutive_auth_failures = 0usize;
        let mut last_fetch: Option<Instant> = None;

        'roots: for root in root_keys {
            if visited.contains(root) {
                continue;
            }

            // Explicit DFS stack; children are pushed in reverse so the
            // first child is popped (and therefore visited) first.
            let mut stack: Vec<String> = vec![root.clone()];

            while let Some(key) = stack.pop() {
                // Marking before the fetch makes re-entry impossible, even
                // through a cycle inside this same subtree.
                if !visited.insert(key.clone()) {
                    continue;
                }

                self.throttle(&mut last_fetch).await;
                outcome.visited += 1;

                let goal = match self.fetcher.fetch_detail(&key).await {
                    Ok(goal) => {
                        consecutive_auth_failures = 0;
                        goal
                    }
                    Err(error) => {
                        let unauthorized = error.is_unauthorized();
                        log::warn!("Failed to fetch goal {key}: {error}");
                        outcome.failures.push(FetchFailure {
                            key: key.clone(),
                            message: error.to_string(),
                        });
                        if self.policy.on_fetch_failure == FailedFetchPolicy::Emit {
                            outcome.goals.push(GoalNode::placeholder(key.as_str()));
                        }

                        if unauthorized {
                            consecutive_auth_failures += 1;
                            if consecutive_auth_failures
                                >= self.policy.max_consecutive_auth_failures
                            {
                                log::error!(
                                    "{consecutive_auth_failures} consecutive unauthorized \
                                     fetches; aborting crawl"
                                );
                                outcome.aborted = true;
                                break 'roots;
                            }
                        } else {
                            consecutive_auth_failures = 0;
                        }

                        // Treat the failed goal as a leaf.
                        continue;
                    }
                };

                for subgoal in goal.subgoals.iter().filter(|s| s.archived) {
                    outcome.skipped_archived.push(SkippedChild {
                        key: subgoal.key.clone(),
                        parent_key: key.clone(),
                    });
                }

                for child_key in goal.active_subgoal_keys().rev() {
                    if !visited.contains(child_key) {
                        stack.push(child_key.to_string());
                    }
                }

                outcome.goals.push(goal);
            }
        }

        Ok(outcome)
    }

    /// Enforce the minimum interval since the previous fetch.
    async fn throttle(&self, last_fetch: &mut Option<Instant>) {
        if let Some(previous) = *last_fetch {
            let elapsed = previous.elapsed();
            if elapsed < self.policy.min_fetch_interval {
                tokio::time::sleep(self.policy.min_fetch_interval - elapsed).await;
            }
        }
        *last_fetch = Some(Instant::now());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use crate::models::SubGoalRef;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// Scripted in-memory goal graph with a fetch log.
    struct ScriptedGraph {
        nodes: HashMap<String, GoalNode>,
        /// Keys whose fetch fails with a plain error
        failing: HashSet<String>,
        /// Keys whose fetch fails as unauthorized
        unauthorized: HashSet<String>,
        fetch_log: Mutex<Vec<String>>,
    }

    impl ScriptedGraph {
        /// Build a graph from `(key, [(child, archived)])` pairs.
        fn new(edges: &[(&str, &[(&str, bool)])]) -> Self {
            let mut nodes = HashMap::new();
            for (key, children) in edges {
                let mut goal = GoalNode::placeholder(*key);
                goal.name = format!("Goal {key}");
                goal.subgoals = children
                    .iter()
                    .map(|(child, archived)| SubGoalRef {
                        key: (*child).to_string(),
                        archived: *archived,
                    })
                    .collect();
                nodes.insert((*key).to_string(), goal);
            }
            Self {
                nodes,
                failing: HashSet::new(),
                unauthorized: HashSet::new(),
                fetch_log: Mutex::new(Vec::new()),
            }
        }

        fn failing(mut self, keys: &[&str]) -> Self {
            self.failing = keys.iter().map(|k| k.to_string()).collect();
            self
        }

        fn unauthorized(mut self, keys: &[&str]) -> Self {
            self.unauthorized = keys.iter().map(|k| k.to_string()).collect();
            self
        }

        fn fetched(&self) -> Vec<String> {
            self.fetch_log.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl GoalFetcher for ScriptedGraph {
        async fn fetch_detail(&self, key: &str) -> Result<GoalNode> {
            self.fetch_log.lock().unwrap().push(key.to_string());
            if self.unauthorized.contains(key) {
                return Err(AppError::Unauthorized {
                    key: key.to_string(),
                });
            }
            if self.failing.contains(key) {
                return Err(AppError::fetch(key, "boom"));
            }
            self.nodes
                .get(key)
                .cloned()
                .ok_or_else(|| AppError::fetch(key, "unknown key"))
        }
    }

    fn zero_delay_policy() -> CrawlPolicy {
        CrawlPolicy {
            min_fetch_interval: Duration::ZERO,
            ..CrawlPolicy::default()
        }
    }

    async fn crawl(graph: &ScriptedGraph, roots: &[&str]) -> CrawlOutcome {
        let crawler = GoalTreeCrawler::new(graph, zero_delay_policy());
        let roots: Vec<String> = roots.iter().map(|r| r.to_string()).collect();
        crawler.crawl(&roots).await.unwrap()
    }

    fn keys(outcome: &CrawlOutcome) -> Vec<&str> {
        outcome.goals.iter().map(|g| g.key.as_str()).collect()
    }

    #[tokio::test]
    async fn empty_roots_yield_empty_outcome() {
        let graph = ScriptedGraph::new(&[]);
        let outcome = crawl(&graph, &[]).await;
        assert!(outcome.goals.is_empty());
        assert!(!outcome.aborted);
    }

    #[tokio::test]
    async fn preorder_depth_first_visit_order() {
        // A
        // ├── B
        // │   ├── D
        // │   └── E
        // └── C
        let graph = ScriptedGraph::new(&[
            ("A", &[("B", false), ("C", false)]),
            ("B", &[("D", false), ("E", false)]),
            ("C", &[]),
            ("D", &[]),
            ("E", &[]),
        ]);

        let outcome = crawl(&graph, &["A"]).await;
        assert_eq!(keys(&outcome), vec!["A", "B", "D", "E", "C"]);
    }

    #[tokio::test]
    async fn cycle_terminates_with_single_visits() {
        let graph = ScriptedGraph::new(&[("A", &[("B", false)]), ("B", &[("A", false)])]);

        let outcome = crawl(&graph, &["A"]).await;
        assert_eq!(keys(&outcome), vec!["A", "B"]);
        assert_eq!(graph.fetched(), vec!["A", "B"]);
    }

    #[tokio::test]
    async fn diamond_fetched_once_first_parent_wins() {
        // A and B both point at C.
        let graph = ScriptedGraph::new(&[
            ("A", &[("C", false)]),
            ("B", &[("C", false)]),
            ("C", &[]),
        ]);

        let outcome = crawl(&graph, &["A", "B"]).await;
        assert_eq!(keys(&outcome), vec!["A", "C", "B"]);
        assert_eq!(graph.fetched().iter().filter(|k| *k == "C").count(), 1);
    }

    #[tokio::test]
    async fn archived_children_reported_never_fetched() {
        let graph = ScriptedGraph::new(&[
            ("A", &[("X", false), ("Y", true)]),
            ("X", &[]),
            ("Y", &[]),
        ]);

        let outcome = crawl(&graph, &["A"]).await;
        assert_eq!(keys(&outcome), vec!["A", "X"]);
        assert!(!graph.fetched().contains(&"Y".to_string()));
        assert_eq!(
            outcome.skipped_archived,
            vec![SkippedChild {
                key: "Y".into(),
                parent_key: "A".into()
            }]
        );
    }

    #[tokio::test]
    async fn completeness_on_depth_three_tree() {
        let graph = ScriptedGraph::new(&[
            ("R1", &[("A", false), ("B", false)]),
            ("R2", &[("C", false)]),
            ("A", &[("A1", false), ("A2", false)]),
            ("B", &[("B1", false)]),
            ("C", &[]),
            ("A1", &[]),
            ("A2", &[]),
            ("B1", &[]),
        ]);

        let outcome = crawl(&graph, &["R1", "R2"]).await;
        let visited: HashSet<&str> = keys(&outcome).into_iter().collect();
        let expected: HashSet<&str> = ["R1", "R2", "A", "B", "C", "A1", "A2", "B1"]
            .into_iter()
            .collect();
        assert_eq!(visited, expected);
    }

    #[tokio::test]
    async fn failed_node_does_not_block_siblings() {
        let graph = ScriptedGraph::new(&[
            ("R", &[("BAD", false), ("GOOD", false)]),
            ("GOOD", &[("LEAF", false)]),
            ("LEAF", &[]),
        ])
        .failing(&["BAD"]);

        let outcome = crawl(&graph, &["R"]).await;
        assert_eq!(keys(&outcome), vec!["R", "GOOD", "LEAF"]);
        assert_eq!(outcome.failures.len(), 1);
        assert_eq!(outcome.failures[0].key, "BAD");
        assert!(!outcome.aborted);
    }

    #[tokio::test]
    async fn emit_policy_produces_placeholder_row() {
        let graph = ScriptedGraph::new(&[("R", &[("BAD", false)])]).failing(&["BAD"]);
        let policy = CrawlPolicy {
            on_fetch_failure: FailedFetchPolicy::Emit,
            ..zero_delay_policy()
        };
        let crawler = GoalTreeCrawler::new(&graph, policy);

        let outcome = crawler.crawl(&["R".to_string()]).await.unwrap();
        assert_eq!(keys(&outcome), vec!["R", "BAD"]);
        let placeholder = &outcome.goals[1];
        assert!(placeholder.name.is_empty());
        assert!(placeholder.owner.is_none());
    }

    #[tokio::test]
    async fn three_consecutive_unauthorized_aborts() {
        let graph = ScriptedGraph::new(&[
            ("R", &[("U1", false), ("U2", false), ("U3", false), ("LATE", false)]),
            ("LATE", &[]),
        ])
        .unauthorized(&["U1", "U2", "U3"]);

        let outcome = crawl(&graph, &["R"]).await;
        assert!(outcome.aborted);
        // Only the pre-abort visit made it into the output.
        assert_eq!(keys(&outcome), vec!["R"]);
        assert!(!graph.fetched().contains(&"LATE".to_string()));
        assert_eq!(outcome.failures.len(), 3);
    }

    #[tokio::test]
    async fn success_resets_unauthorized_streak() {
        let graph = ScriptedGraph::new(&[
            (
                "R",
                &[("U1", false), ("OK1", false), ("U2", false), ("U3", false), ("OK2", false)],
            ),
            ("OK1", &[]),
            ("OK2", &[]),
        ])
        .unauthorized(&["U1", "U2", "U3"]);

        let outcome = crawl(&graph, &["R"]).await;
        // The streak never reaches three, so the crawl completes.
        assert!(!outcome.aborted);
        assert_eq!(keys(&outcome), vec!["R", "OK1", "OK2"]);
        assert_eq!(outcome.failures.len(), 3);
    }

    #[tokio::test]
    async fn roots_a_b_with_archived_child_and_cycle_back() {
        // Roots [A, B]; A has children [C (active), D (archived)];
        // C has none; B's child A cycles back to the first root.
        let graph = ScriptedGraph::new(&[
            ("A", &[("C", false), ("D", true)]),
            ("B", &[("A", false)]),
            ("C", &[]),
        ]);

        let outcome = crawl(&graph, &["A", "B"]).await;
        assert_eq!(keys(&outcome), vec!["A", "C", "B"]);
        assert_eq!(graph.fetched(), vec!["A", "C", "B"]);
        assert_eq!(
            outcome.skipped_archived,
            vec![SkippedChild {
                key: "D".into(),
                parent_key: "A".into()
            }]
        );
    }

    #[tokio::test]
    async fn duplicate_roots_visited_once() {
        let graph = ScriptedGraph::new(&[("A", &[])]);
        let outcome = crawl(&graph, &["A", "A"]).await;
        assert_eq!(keys(&outcome), vec!["A"]);
        assert_eq!(graph.fetched(), vec!["A"]);
    }
}
