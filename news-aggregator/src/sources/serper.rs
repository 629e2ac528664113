use crate::fetcher::Fetcher;
use crate::filters::is_excluded_serper;
use crate::normalize::{normalize_serper, serper_items};
use crate::traits::PullNews;
use crate::types::{AggregatorError, Article, Result};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::debug;

pub const DEFAULT_SERPER_KEYWORDS: &str = "(企画展 OR 特別展)";
pub const DEFAULT_SERPER_NUM: u32 = 20;
/// How far back the rolling `after:` window reaches.
pub const SERPER_LOOKBACK_DAYS: i64 = 3;

/// Search-style adapter: one POST per pull, results under `news` or `organic`.
pub struct SerperSource {
    fetcher: Arc<Fetcher>,
    api_url: Option<String>,
    api_key: Option<String>,
    keywords: String,
    num: u32,
}

impl SerperSource {
    pub fn new(fetcher: Arc<Fetcher>, api_url: Option<String>, api_key: Option<String>) -> Self {
        Self {
            fetcher,
            api_url,
            api_key,
            keywords: DEFAULT_SERPER_KEYWORDS.to_string(),
            num: DEFAULT_SERPER_NUM,
        }
    }

    pub fn with_query(mut self, keywords: impl Into<String>, num: u32) -> Self {
        self.keywords = keywords.into();
        self.num = num;
        self
    }

    /// Keywords plus an `after:` date three days before `now`.
    pub fn build_query(&self, now: DateTime<Utc>) -> String {
        let after_date = (now - Duration::days(SERPER_LOOKBACK_DAYS)).format("%Y-%m-%d");
        format!("{} after:{}", self.keywords, after_date)
    }

    pub fn request_body(&self, now: DateTime<Utc>) -> Value {
        json!({ "q": self.build_query(now), "num": self.num })
    }

    /// Drops aggregator reposts, then normalizes what is left.
    pub fn extract_articles(response: &Value) -> Vec<Article> {
        serper_items(response)
            .iter()
            .filter(|item| !is_excluded_serper(item))
            .map(normalize_serper)
            .collect()
    }
}

#[async_trait]
impl PullNews for SerperSource {
    fn source_id(&self) -> String {
        "serper".to_string()
    }

    fn source_name(&self) -> String {
        "Serper".to_string()
    }

    async fn try_pull(&self, now: DateTime<Utc>) -> Result<Vec<Article>> {
        let (Some(api_url), Some(api_key)) = (self.api_url.as_deref(), self.api_key.as_deref()) else {
            return Err(AggregatorError::Config(
                "SERPER_API_URL and SERPER_API_KEY must both be set".to_string(),
            ));
        };

        let body = self.request_body(now);
        debug!("Serper query: {}", body["q"]);

        let headers = [("X-API-KEY", api_key), ("Content-Type", "application/json")];
        let response = self.fetcher.post_json(api_url, &headers, &body).await?;
        Ok(Self::extract_articles(&response))
    }
}
