use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub use interfaces::defs::{Article, BlogPost, NewPost, NewsPayload, RssGroup};
pub use interfaces::defs::{PLACEHOLDER_LINK, PLACEHOLDER_TITLE};

#[derive(Debug, Clone)]
pub struct FetchConfig {
    pub user_agent: String,
    pub timeout_seconds: u64,
    pub max_retries: u32,
    pub retry_delay_seconds: u64,
    pub max_redirects: usize,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            user_agent: "News-Aggregator/1.0".to_string(),
            timeout_seconds: 10,
            max_retries: 1,
            retry_delay_seconds: 1,
            max_redirects: 5,
        }
    }
}

/// One entry of the feed site registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedSite {
    pub name: String,
    pub url: String,
    #[serde(default)]
    pub description: String,
    pub limit: usize,
    #[serde(default)]
    pub icon_url: Option<String>,
    /// UTC offset of the dates the feed writes, in hours. Used to find an
    /// entry's calendar day.
    #[serde(default)]
    pub utc_offset_hours: Option<i32>,
}

#[derive(Debug)]
pub struct ParsedFeed {
    pub entries: Vec<ParsedEntry>,
}

#[derive(Debug, Clone)]
pub struct ParsedEntry {
    pub title: Option<String>,
    pub link: Option<String>,
    pub author: Option<String>,
    pub published: Option<DateTime<Utc>>,
}

#[derive(Debug, thiserror::Error)]
pub enum AggregatorError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Timed out after {seconds} seconds")]
    Timeout { seconds: u64 },

    #[error("Invalid post: {0}")]
    InvalidPost(String),

    #[error("Post not found: {id}")]
    PostNotFound { id: u64 },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("General error: {0}")]
    General(String),
}

pub type Result<T> = std::result::Result<T, AggregatorError>;
