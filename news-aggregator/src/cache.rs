use crate::aggregator::NewsAggregator;
use crate::types::NewsPayload;
use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info};

pub const DEFAULT_TTL_MINUTES: i64 = 30;
pub const DEFAULT_EMPTY_TTL_MINUTES: i64 = 5;

struct CacheEntry {
    payload: Arc<NewsPayload>,
    last_refreshed: DateTime<Utc>,
}

/// Single-entry, time-expiring cache over [`NewsAggregator`].
///
/// The lock is held across a refresh, so concurrent callers that find the
/// entry stale wait for the one refresh in flight instead of starting their own.
pub struct NewsCache {
    aggregator: NewsAggregator,
    ttl: Duration,
    empty_ttl: Duration,
    entry: Mutex<Option<CacheEntry>>,
}

impl NewsCache {
    pub fn new(aggregator: NewsAggregator) -> Self {
        Self::with_ttl(
            aggregator,
            Duration::minutes(DEFAULT_TTL_MINUTES),
            Duration::minutes(DEFAULT_EMPTY_TTL_MINUTES),
        )
    }

    /// `empty_ttl` applies when a refresh came back with no articles at all.
    /// It is capped at `ttl`.
    pub fn with_ttl(aggregator: NewsAggregator, ttl: Duration, empty_ttl: Duration) -> Self {
        Self {
            aggregator,
            ttl,
            empty_ttl: empty_ttl.min(ttl),
            entry: Mutex::new(None),
        }
    }

    pub async fn get_current(&self, now: DateTime<Utc>) -> Arc<NewsPayload> {
        let mut entry = self.entry.lock().await;

        if let Some(cached) = entry.as_ref() {
            let age = now.signed_duration_since(cached.last_refreshed);
            if age < self.ttl_for(&cached.payload) {
                debug!("Serving cached news ({}s old)", age.num_seconds());
                return cached.payload.clone();
            }
            info!("Cached news expired after {}s", age.num_seconds());
        }

        let payload = Arc::new(self.aggregator.refresh(now).await);
        *entry = Some(CacheEntry {
            payload: payload.clone(),
            last_refreshed: now,
        });
        payload
    }

    /// Forces the next [`NewsCache::get_current`] to refresh.
    pub async fn invalidate(&self) {
        *self.entry.lock().await = None;
        info!("News cache invalidated");
    }

    pub async fn last_refreshed(&self) -> Option<DateTime<Utc>> {
        self.entry.lock().await.as_ref().map(|cached| cached.last_refreshed)
    }

    fn ttl_for(&self, payload: &NewsPayload) -> Duration {
        if payload.is_empty() {
            self.empty_ttl
        } else {
            self.ttl
        }
    }
}
