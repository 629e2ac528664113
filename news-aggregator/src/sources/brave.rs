use crate::fetcher::Fetcher;
use crate::filters::is_excluded_brave;
use crate::normalize::{brave_items, normalize_brave};
use crate::traits::PullNews;
use crate::types::{AggregatorError, Article, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use std::sync::Arc;

/// News-search adapter: one GET per pull with fixed query parameters.
pub struct BraveNewsSource {
    fetcher: Arc<Fetcher>,
    api_url: Option<String>,
    api_key: Option<String>,
    params: BraveQuery,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BraveQuery {
    pub q: String,
    pub count: u32,
    pub country: String,
    pub freshness: String,
}

impl Default for BraveQuery {
    fn default() -> Self {
        Self {
            q: "アニメ インタビュー SF".to_string(),
            count: 10,
            country: "jp".to_string(),
            freshness: "3d".to_string(),
        }
    }
}

impl BraveQuery {
    pub fn as_pairs(&self) -> Vec<(&'static str, String)> {
        vec![
            ("q", self.q.clone()),
            ("count", self.count.to_string()),
            ("country", self.country.clone()),
            ("freshness", self.freshness.clone()),
        ]
    }
}

impl BraveNewsSource {
    pub fn new(fetcher: Arc<Fetcher>, api_url: Option<String>, api_key: Option<String>) -> Self {
        Self {
            fetcher,
            api_url,
            api_key,
            params: BraveQuery::default(),
        }
    }

    pub fn with_query(mut self, params: BraveQuery) -> Self {
        self.params = params;
        self
    }

    /// Drops excluded publishers and listing pages, then normalizes.
    pub fn extract_articles(response: &Value) -> Vec<Article> {
        brave_items(response)
            .iter()
            .filter(|item| !is_excluded_brave(item))
            .map(normalize_brave)
            .collect()
    }
}

#[async_trait]
impl PullNews for BraveNewsSource {
    fn source_id(&self) -> String {
        "brave_news".to_string()
    }

    fn source_name(&self) -> String {
        "Brave News".to_string()
    }

    async fn try_pull(&self, _now: DateTime<Utc>) -> Result<Vec<Article>> {
        let (Some(api_url), Some(api_key)) = (self.api_url.as_deref(), self.api_key.as_deref()) else {
            return Err(AggregatorError::Config(
                "BRAVE_NEWS_URL and BRAVE_API_KEY must both be set".to_string(),
            ));
        };

        let headers = [("X-Subscription-Token", api_key), ("Accept", "application/json")];
        let query = self.params.as_pairs();
        let response = self.fetcher.get_json(api_url, &headers, &query).await?;
        Ok(Self::extract_articles(&response))
    }
}
