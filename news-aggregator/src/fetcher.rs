use crate::types::{AggregatorError, FetchConfig, Result};
use backoff::{backoff::Backoff, exponential::ExponentialBackoff};
use reqwest::{Client, RequestBuilder, Response};
use serde_json::Value;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Shared HTTP client for every source adapter.
pub struct Fetcher {
    client: Client,
    config: FetchConfig,
}

impl Fetcher {
    pub fn new(config: FetchConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(Duration::from_secs(config.timeout_seconds))
            .gzip(true)
            .deflate(true)
            .brotli(true)
            .redirect(reqwest::redirect::Policy::limited(config.max_redirects))
            .build()?;

        Ok(Self { client, config })
    }

    /// Fetches a feed document as text.
    pub async fn get_text(&self, url: &str) -> Result<String> {
        let response = self.send_with_retry(url, || self.client.get(url)).await?;
        let content = response.text().await?;
        debug!("Fetched {} ({} bytes)", url, content.len());
        Ok(content)
    }

    pub async fn get_json(
        &self,
        url: &str,
        headers: &[(&str, &str)],
        query: &[(&str, String)],
    ) -> Result<Value> {
        let response = self
            .send_with_retry(url, || {
                let mut request = self.client.get(url).query(query);
                for (name, value) in headers {
                    request = request.header(*name, *value);
                }
                request
            })
            .await?;
        Self::read_json(url, response).await
    }

    pub async fn post_json(&self, url: &str, headers: &[(&str, &str)], body: &Value) -> Result<Value> {
        let response = self
            .send_with_retry(url, || {
                let mut request = self.client.post(url).json(body);
                for (name, value) in headers {
                    request = request.header(*name, *value);
                }
                request
            })
            .await?;
        Self::read_json(url, response).await
    }

    async fn read_json(url: &str, response: Response) -> Result<Value> {
        let body = response.text().await?;
        serde_json::from_str(&body)
            .map_err(|e| AggregatorError::Parse(format!("Malformed JSON from {}: {}", url, e)))
    }

    async fn send_with_retry<F>(&self, url: &str, build: F) -> Result<Response>
    where
        F: Fn() -> RequestBuilder,
    {
        let start_time = Instant::now();
        let retry_delay = Duration::from_secs(self.config.retry_delay_seconds);
        let mut backoff: ExponentialBackoff<backoff::SystemClock> = ExponentialBackoff {
            current_interval: retry_delay,
            initial_interval: retry_delay,
            max_interval: retry_delay * 8,
            multiplier: 2.0,
            max_elapsed_time: Some(Duration::from_secs(self.config.timeout_seconds * 2)),
            ..Default::default()
        };

        let mut attempt = 0;
        loop {
            let error = match build().send().await {
                Ok(response) if response.status().is_success() => {
                    debug!(
                        "{} answered {} in {}ms",
                        url,
                        response.status(),
                        start_time.elapsed().as_millis()
                    );
                    return Ok(response);
                }
                Ok(response) => {
                    let status = response.status();
                    AggregatorError::General(format!(
                        "HTTP {}: {}",
                        status.as_u16(),
                        status.canonical_reason().unwrap_or("Unknown")
                    ))
                }
                Err(e) => AggregatorError::Http(e),
            };

            if attempt >= self.config.max_retries {
                return Err(error);
            }
            attempt += 1;
            match backoff.next_backoff() {
                Some(delay) => {
                    warn!("Attempt {} failed for {}: {}; retrying in {:?}", attempt, url, error, delay);
                    tokio::time::sleep(delay).await;
                }
                None => return Err(error),
            }
        }
    }
}
