use crate::config::AppConfig;
use crate::dedup::{dedup_articles, merge};
use crate::fetcher::Fetcher;
use crate::sources::{BraveNewsSource, RssSitesSource, SerperSource};
use crate::traits::{PullFeedGroups, PullNews};
use crate::types::{NewsPayload, Result};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// Runs one refresh cycle across every source.
pub struct NewsAggregator {
    academic: Box<dyn PullNews>,
    subculture: Box<dyn PullNews>,
    rss: Box<dyn PullFeedGroups>,
    adapter_timeout: Duration,
}

impl NewsAggregator {
    pub fn new(
        academic: Box<dyn PullNews>,
        subculture: Box<dyn PullNews>,
        rss: Box<dyn PullFeedGroups>,
        adapter_timeout: Duration,
    ) -> Self {
        Self {
            academic,
            subculture,
            rss,
            adapter_timeout,
        }
    }

    /// Wires the three production adapters from configuration.
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let fetcher = Arc::new(Fetcher::new(config.fetch.clone())?);

        let academic = SerperSource::new(
            fetcher.clone(),
            config.serper_api_url.clone(),
            config.serper_api_key.clone(),
        );
        let subculture = BraveNewsSource::new(
            fetcher.clone(),
            config.brave_news_url.clone(),
            config.brave_api_key.clone(),
        );
        let rss = RssSitesSource::new(fetcher, config.rss_sites.clone());

        Ok(Self::new(
            Box::new(academic),
            Box::new(subculture),
            Box::new(rss),
            config.adapter_timeout,
        ))
    }

    /// All adapters run concurrently; a failed one contributes an empty list.
    pub async fn refresh(&self, now: DateTime<Utc>) -> NewsPayload {
        info!(
            "Refreshing news from {}, {} and {}",
            self.academic.source_name(),
            self.subculture.source_name(),
            self.rss.source_name()
        );

        let (academic, subculture, rss) = futures::join!(
            self.academic.pull(now, self.adapter_timeout),
            self.subculture.pull(now, self.adapter_timeout),
            self.rss.pull_groups(now, self.adapter_timeout),
        );

        let academic = dedup_articles(academic);
        let subculture = dedup_articles(subculture);
        let news = merge([academic.clone(), subculture.clone()]);

        info!(
            "Refresh produced {} merged articles ({} academic, {} subculture) and {} feed groups",
            news.len(),
            academic.len(),
            subculture.len(),
            rss.len()
        );

        NewsPayload {
            academic,
            subculture,
            news,
            rss,
            refreshed_at: now,
        }
    }
}
