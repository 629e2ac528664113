use crate::types::{AggregatorError, Article, Result, RssGroup};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::time::Duration;
use tracing::{info, warn};

/// A source that yields a flat list of normalized articles.
#[async_trait]
pub trait PullNews: Send + Sync {
    /// Unique identifier for this source
    fn source_id(&self) -> String;

    /// Human-readable name for this source
    fn source_name(&self) -> String;

    /// Fetch, filter and normalize. Errors stay inside the adapter; callers
    /// go through [`PullNews::pull`].
    async fn try_pull(&self, now: DateTime<Utc>) -> Result<Vec<Article>>;

    /// Never fails: a timeout or any error yields an empty list.
    async fn pull(&self, now: DateTime<Utc>, timeout: Duration) -> Vec<Article> {
        let outcome = match tokio::time::timeout(timeout, self.try_pull(now)).await {
            Ok(result) => result,
            Err(_) => Err(AggregatorError::Timeout {
                seconds: timeout.as_secs(),
            }),
        };

        match outcome {
            Ok(articles) => {
                info!("{} returned {} articles", self.source_name(), articles.len());
                articles
            }
            Err(e) => {
                warn!(source = %self.source_id(), "{} failed, contributing no articles: {}", self.source_name(), e);
                Vec::new()
            }
        }
    }
}

/// A source that yields one group of articles per configured site.
#[async_trait]
pub trait PullFeedGroups: Send + Sync {
    fn source_name(&self) -> String;

    /// Never fails: a site that cannot be fetched keeps its group with no articles.
    async fn pull_groups(&self, now: DateTime<Utc>, timeout: Duration) -> Vec<RssGroup>;
}
