// src/services/goals.rs

//! Goal directory service.
//!
//! Talks to the vendor GraphQL gateway: pages through the root goals of a
//! saved directory view and fetches per-goal detail. All nested response
//! fields are nullable on the wire; parsing coalesces every absent level
//! to an empty value instead of failing.

use async_trait::async_trait;
use reqwest::{Client, StatusCode, header};
use serde::Deserialize;
use serde_json::json;

use crate::error::{AppError, Result};
use crate::models::{ApiConfig, GoalNode, SubGoalRef};
use crate::services::GoalFetcher;

/// Operation name the gateway expects for the root listing.
const LIST_OPERATION: &str = "DirectoryTableViewGoalPaginationQuery";

/// Operation name the gateway expects for the per-goal detail view.
const DETAIL_OPERATION: &str = "GoalViewAsideQuery";

const LIST_QUERY: &str = "query Goals($after: String, $containerId: String, \
     $directoryViewUuid: UUID, $first: Int = 50, $workspaceUuid: UUID) { \
     goalTqlFullHierarchy(first: $first, after: $after, workspaceUuid: $workspaceUuid, \
     containerId: $containerId, directoryViewUuid: $directoryViewUuid) { \
     count edges { node { key } cursor } pageInfo { endCursor hasNextPage } } }";

const DETAIL_QUERY: &str = "query GoalViewAsideQuery($key: String!) { \
     goal: goalByKey(key: $key) { owner { pii { name } } key name archived \
     targetDate startDate creationDate progress { type } parentGoal { key } \
     subGoals { edges { node { key archived } } } \
     tags { edges { node { name } } } teamsV2 { edges { node { name } } } \
     customFields { edges { node { ... on TextSelectCustomField { \
     values { edges { node { value } } } } } } } id } }";

/// Client for the remote Goal directory.
pub struct GoalDirectory {
    config: ApiConfig,
    client: Client,
}

impl GoalDirectory {
    /// Create a new directory client over a configured HTTP client.
    pub fn new(config: ApiConfig, client: Client) -> Self {
        Self { config, client }
    }

    fn graphql_url(&self, operation: &str) -> String {
        format!(
            "{}/gateway/api/townsquare/s/{}/graphql?operationName={}",
            self.config.base_url, self.config.cloud_id, operation
        )
    }

    fn container_id(&self) -> String {
        format!("ari:cloud:townsquare::site/{}", self.config.cloud_id)
    }

    /// List every root goal key of the configured directory view.
    ///
    /// Pages through the listing with cursor pagination and returns the
    /// flattened key list. Any failure here is fatal: without roots the
    /// crawl cannot start.
    pub async fn list_roots(&self) -> Result<Vec<String>> {
        let url = self.graphql_url(LIST_OPERATION);
        let referer = format!(
            "{}/o/{}/goals?viewUuid={}&cloudId={}",
            self.config.base_url,
            self.config.organization_id,
            self.config.directory_view_uuid,
            self.config.cloud_id
        );

        let mut roots = Vec::new();
        let mut after: Option<String> = None;
        let mut page = 0usize;

        loop {
            let payload = json!({
                "query": LIST_QUERY,
                "variables": {
                    "after": after,
                    "containerId": self.container_id(),
                    "directoryViewUuid": self.config.directory_view_uuid,
                    "first": self.config.page_size,
                    "workspaceUuid": self.config.workspace_uuid,
                }
            });

            let response = self
                .client
                .post(&url)
                .header(header::REFERER, &referer)
                .json(&payload)
                .send()
                .await
                .map_err(AppError::listing)?;

            let status = response.status();
            if !status.is_success() {
                return Err(AppError::listing(format!("listing returned HTTP {status}")));
            }

            let body: GraphqlResponse<ListingData> =
                response.json().await.map_err(AppError::listing)?;
            if let Some(error) = body.errors.first() {
                return Err(AppError::listing(&error.message));
            }

            let hierarchy = body
                .data
                .and_then(|d| d.goal_hierarchy)
                .ok_or_else(|| AppError::listing("no goal hierarchy in listing response"))?;

            page += 1;
            for edge in hierarchy.edges {
                if let Some(key) = edge.node.and_then(|n| n.key).filter(|k| !k.is_empty()) {
                    roots.push(key);
                }
            }

            match hierarchy.page_info {
                Some(info) if info.has_next_page && info.end_cursor.is_some() => {
                    after = info.end_cursor;
                }
                _ => break,
            }
        }

        if roots.is_empty() {
            return Err(AppError::listing("listing returned no parseable roots"));
        }

        log::info!("Listed {} root goals across {} page(s)", roots.len(), page);
        Ok(roots)
    }

    async fn fetch_goal(&self, key: &str) -> Result<GoalNode> {
        let url = self.graphql_url(DETAIL_OPERATION);
        let referer = format!(
            "{}/o/{}/s/{}/goal/{}",
            self.config.base_url, self.config.organization_id, self.config.cloud_id, key
        );
        let payload = json!({
            "query": DETAIL_QUERY,
            "variables": { "key": key }
        });

        let response = self
            .client
            .post(&url)
            .header(header::REFERER, &referer)
            .json(&payload)
            .send()
            .await
            .map_err(|e| AppError::fetch(key, e))?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(AppError::Unauthorized {
                key: key.to_string(),
            });
        }
        if !status.is_success() {
            return Err(AppError::fetch(key, format!("HTTP {status}")));
        }

        let body: GraphqlResponse<GoalData> = response
            .json()
            .await
            .map_err(|e| AppError::fetch(key, e))?;
        if let Some(error) = body.errors.first() {
            return Err(AppError::fetch(key, &error.message));
        }

        let detail = body
            .data
            .and_then(|d| d.goal)
            .ok_or_else(|| AppError::fetch(key, "no goal data in response"))?;

        Ok(detail.into_goal_node(key))
    }
}

#[async_trait]
impl GoalFetcher for GoalDirectory {
    async fn fetch_detail(&self, key: &str) -> Result<GoalNode> {
        self.fetch_goal(key).await
    }
}

// ---------------------------------------------------------------------------
// Wire format
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct GraphqlResponse<T> {
    #[serde(default)]
    data: Option<T>,
    #[serde(default)]
    errors: Vec<GraphqlError>,
}

#[derive(Debug, Deserialize, Default)]
struct GraphqlError {
    #[serde(default)]
    message: String,
}

#[derive(Debug, Deserialize)]
struct Edge<T> {
    #[serde(default = "Option::default")]
    node: Option<T>,
}

#[derive(Debug, Deserialize)]
struct Connection<T> {
    #[serde(default = "Vec::new")]
    edges: Vec<Edge<T>>,
}

#[derive(Debug, Deserialize, Default)]
struct ListingData {
    #[serde(rename = "goalTqlFullHierarchy", default)]
    goal_hierarchy: Option<GoalPage>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
struct GoalPage {
    edges: Vec<Edge<KeyNode>>,
    page_info: Option<PageInfo>,
}

#[derive(Debug, Deserialize, Default)]
struct KeyNode {
    #[serde(default)]
    key: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
struct PageInfo {
    end_cursor: Option<String>,
    has_next_page: bool,
}

#[derive(Debug, Deserialize, Default)]
struct GoalData {
    #[serde(default)]
    goal: Option<GoalDetail>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
struct GoalDetail {
    key: Option<String>,
    name: Option<String>,
    archived: bool,
    owner: Option<OwnerNode>,
    target_date: Option<String>,
    start_date: Option<String>,
    creation_date: Option<String>,
    progress: Option<ProgressNode>,
    parent_goal: Option<KeyNode>,
    sub_goals: Option<Connection<SubGoalNode>>,
    tags: Option<Connection<NamedNode>>,
    teams_v2: Option<Connection<NamedNode>>,
    custom_fields: Option<Connection<CustomFieldNode>>,
    id: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
struct OwnerNode {
    #[serde(default)]
    pii: Option<PiiNode>,
}

#[derive(Debug, Deserialize, Default)]
struct PiiNode {
    #[serde(default)]
    name: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
struct ProgressNode {
    #[serde(rename = "type", default)]
    kind: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct SubGoalNode {
    key: Option<String>,
    archived: bool,
}

#[derive(Debug, Deserialize, Default)]
struct NamedNode {
    #[serde(default)]
    name: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
struct CustomFieldNode {
    #[serde(default)]
    values: Option<Connection<ValueNode>>,
}

#[derive(Debug, Deserialize, Default)]
struct ValueNode {
    #[serde(default)]
    value: Option<String>,
}

impl GoalDetail {
    /// Flatten the nested wire shape into a [`GoalNode`].
    ///
    /// `requested_key` backs the record when the response omits the key.
    fn into_goal_node(self, requested_key: &str) -> GoalNode {
        let subgoals = connection_nodes(self.sub_goals)
            .filter_map(|node| {
                node.key
                    .filter(|k| !k.is_empty())
                    .map(|key| SubGoalRef {
                        key,
                        archived: node.archived,
                    })
            })
            .collect();

        let tags = named_values(self.tags);
        let teams = named_values(self.teams_v2);

        // First non-empty custom field value carries the lineage path.
        let lineage = connection_nodes(self.custom_fields)
            .flat_map(|field| connection_nodes(field.values))
            .filter_map(|v| v.value)
            .find(|v| !v.is_empty());

        GoalNode {
            key: self
                .key
                .filter(|k| !k.is_empty())
                .unwrap_or_else(|| requested_key.to_string()),
            name: self.name.unwrap_or_default(),
            owner: self
                .owner
                .and_then(|o| o.pii)
                .and_then(|p| p.name)
                .filter(|n| !n.is_empty()),
            target_date: self.target_date.filter(|d| !d.is_empty()),
            start_date: self.start_date.filter(|d| !d.is_empty()),
            creation_date: self.creation_date.filter(|d| !d.is_empty()),
            parent_key: self.parent_goal.and_then(|p| p.key).filter(|k| !k.is_empty()),
            subgoals,
            tags,
            progress_type: self
                .progress
                .and_then(|p| p.kind)
                .filter(|t| !t.is_empty()),
            teams,
            lineage,
            entity_id: self.id.filter(|i| !i.is_empty()),
            archived: self.archived,
        }
    }
}

fn connection_nodes<T>(connection: Option<Connection<T>>) -> impl Iterator<Item = T> {
    connection
        .map(|c| c.edges)
        .unwrap_or_default()
        .into_iter()
        .filter_map(|edge| edge.node)
}

fn named_values(connection: Option<Connection<NamedNode>>) -> Vec<String> {
    connection_nodes(connection)
        .filter_map(|n| n.name)
        .filter(|n| !n.is_empty())
        .collect()
}
