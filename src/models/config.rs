//! Application configuration structures.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// Root application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Remote Goal directory endpoints and identifiers
    #[serde(default)]
    pub api: ApiConfig,

    /// HTTP and traversal behavior settings
    #[serde(default)]
    pub crawler: CrawlerConfig,

    /// Snapshot output settings
    #[serde(default)]
    pub output: OutputConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Load configuration or return default if loading fails.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        Self::load(&path).unwrap_or_else(|e| {
            log::warn!(
                "Config load failed from {:?}: {}. Using defaults.",
                path.as_ref(),
                e
            );
            Self::default()
        })
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        if self.api.base_url.trim().is_empty() {
            return Err(AppError::validation("api.base_url is empty"));
        }
        url::Url::parse(&self.api.base_url)
            .map_err(|e| AppError::validation(format!("api.base_url is not a valid URL: {e}")))?;
        if self.api.cloud_id.trim().is_empty() {
            return Err(AppError::validation("api.cloud_id is empty"));
        }
        if self.api.organization_id.trim().is_empty() {
            return Err(AppError::validation("api.organization_id is empty"));
        }
        if self.api.workspace_uuid.trim().is_empty() {
            return Err(AppError::validation("api.workspace_uuid is empty"));
        }
        if self.api.directory_view_uuid.trim().is_empty() {
            return Err(AppError::validation("api.directory_view_uuid is empty"));
        }
        if self.api.page_size == 0 {
            return Err(AppError::validation("api.page_size must be > 0"));
        }
        if self.crawler.user_agent.trim().is_empty() {
            return Err(AppError::validation("crawler.user_agent is empty"));
        }
        if self.crawler.timeout_secs == 0 {
            return Err(AppError::validation("crawler.timeout_secs must be > 0"));
        }
        if self.crawler.max_consecutive_auth_failures == 0 {
            return Err(AppError::validation(
                "crawler.max_consecutive_auth_failures must be > 0",
            ));
        }
        Ok(())
    }
}

/// Remote Goal directory identifiers.
///
/// These mirror the values the vendor frontend sends: the site and
/// organization the workspace lives in, plus the saved directory view and
/// the custom field holding the lineage path.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Base URL of the vendor site (e.g. "https://home.atlassian.com")
    #[serde(default)]
    pub base_url: String,

    /// Organization identifier
    #[serde(default)]
    pub organization_id: String,

    /// Cloud site identifier
    #[serde(default)]
    pub cloud_id: String,

    /// Workspace UUID scoping the goal listing
    #[serde(default)]
    pub workspace_uuid: String,

    /// Saved directory view UUID used for the root listing
    #[serde(default)]
    pub directory_view_uuid: String,

    /// UUID of the custom field carrying the lineage path
    #[serde(default)]
    pub custom_field_uuid: String,

    /// Page size for the root listing query
    #[serde(default = "defaults::page_size")]
    pub page_size: u32,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            organization_id: String::new(),
            cloud_id: String::new(),
            workspace_uuid: String::new(),
            directory_view_uuid: String::new(),
            custom_field_uuid: String::new(),
            page_size: defaults::page_size(),
        }
    }
}

/// HTTP client and traversal behavior settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlerConfig {
    /// User-Agent header for HTTP requests
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,

    /// Request timeout in seconds
    #[serde(default = "defaults::timeout")]
    pub timeout_secs: u64,

    /// Minimum interval between successive detail fetches in milliseconds
    #[serde(default = "defaults::request_delay")]
    pub request_delay_ms: u64,

    /// Consecutive unauthorized fetches tolerated before aborting the run
    #[serde(default = "defaults::max_consecutive_auth_failures")]
    pub max_consecutive_auth_failures: usize,

    /// What to do with a goal whose detail fetch returned no data
    #[serde(default)]
    pub on_fetch_failure: FailedFetchPolicy,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            user_agent: defaults::user_agent(),
            timeout_secs: defaults::timeout(),
            request_delay_ms: defaults::request_delay(),
            max_consecutive_auth_failures: defaults::max_consecutive_auth_failures(),
            on_fetch_failure: FailedFetchPolicy::default(),
        }
    }
}

/// Row policy for goals whose detail fetch failed outright.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailedFetchPolicy {
    /// Record the failure only; no row is emitted
    #[default]
    Omit,
    /// Emit an all-null placeholder row so downstream counts stay stable
    Emit,
}

/// Snapshot output settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Root directory for snapshot files
    #[serde(default = "defaults::root_dir")]
    pub root_dir: String,

    /// Key prefix under the root directory
    #[serde(default = "defaults::prefix")]
    pub prefix: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            root_dir: defaults::root_dir(),
            prefix: defaults::prefix(),
        }
    }
}

mod defaults {
    // Api defaults
    pub fn page_size() -> u32 {
        50
    }

    // Crawler defaults
    pub fn user_agent() -> String {
        "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 \
         (KHTML, like Gecko) Chrome/137.0.0.0 Safari/537.36"
            .into()
    }
    pub fn timeout() -> u64 {
        30
    }
    pub fn request_delay() -> u64 {
        300
    }
    pub fn max_consecutive_auth_failures() -> usize {
        3
    }

    // Output defaults
    pub fn root_dir() -> String {
        "storage".into()
    }
    pub fn prefix() -> String {
        "okrs".into()
    }
}
