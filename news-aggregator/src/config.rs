use crate::cache::{DEFAULT_EMPTY_TTL_MINUTES, DEFAULT_TTL_MINUTES};
use crate::sources::rss_feed::JST_OFFSET_HOURS;
use crate::types::{AggregatorError, FeedSite, FetchConfig, Result};
use std::collections::HashSet;
use std::env;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{info, warn};
use url::Url;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub serper_api_url: Option<String>,
    pub serper_api_key: Option<String>,
    pub brave_news_url: Option<String>,
    pub brave_api_key: Option<String>,
    pub admin_password: Option<String>,
    pub blog_store_path: PathBuf,
    pub bind_addr: String,
    pub cache_ttl: chrono::Duration,
    pub cache_empty_ttl: chrono::Duration,
    pub adapter_timeout: Duration,
    pub fetch: FetchConfig,
    pub rss_sites: Vec<FeedSite>,
}

impl AppConfig {
    /// Reads the environment once at startup. A `.env` file is honoured if present.
    pub fn from_env() -> Result<Self> {
        if dotenv::dotenv().is_ok() {
            info!("Loaded environment from .env");
        }

        let rss_sites = match env_opt("RSS_SITES_FILE") {
            Some(path) => load_sites_file(&path)?,
            None => default_sites(),
        };
        validate_sites(&rss_sites)?;

        let config = Self {
            serper_api_url: env_opt("SERPER_API_URL"),
            serper_api_key: env_opt("SERPER_API_KEY"),
            brave_news_url: env_opt("BRAVE_NEWS_URL"),
            brave_api_key: env_opt("BRAVE_API_KEY"),
            admin_password: env_opt("ADMIN_PASSWORD"),
            blog_store_path: env_opt("BLOG_STORE_PATH")
                .unwrap_or_else(|| "blog_posts.json".to_string())
                .into(),
            bind_addr: env_opt("BIND_ADDR").unwrap_or_else(|| "0.0.0.0:5000".to_string()),
            cache_ttl: env_minutes("CACHE_TTL_MINUTES", DEFAULT_TTL_MINUTES)?,
            cache_empty_ttl: env_minutes("CACHE_EMPTY_TTL_MINUTES", DEFAULT_EMPTY_TTL_MINUTES)?,
            adapter_timeout: Duration::from_secs(env_number("ADAPTER_TIMEOUT_SECONDS", 15)?),
            fetch: FetchConfig::default(),
            rss_sites,
        };

        if config.serper_api_key.is_none() {
            warn!("SERPER_API_KEY is not set; the academic category will stay empty");
        }
        if config.brave_api_key.is_none() {
            warn!("BRAVE_API_KEY is not set; the subculture category will stay empty");
        }
        if config.admin_password.is_none() {
            warn!("ADMIN_PASSWORD is not set; blog writes are disabled");
        }

        Ok(config)
    }
}

/// The built-in site registry, in display order.
pub fn default_sites() -> Vec<FeedSite> {
    vec![
        FeedSite {
            name: "ナゾロジー".to_string(),
            url: "https://nazology.kusuguru.co.jp/feed".to_string(),
            description: "科学ニュースや不思議なトピックを分かりやすく紹介するライトな科学メディアです！  一番良く見てます".to_string(),
            limit: 10,
            icon_url: None,
            utc_offset_hours: None,
        },
        FeedSite {
            name: "Nature Asia".to_string(),
            url: "https://www.natureasia.com/ja-jp/rss".to_string(),
            description: "Nature の日本語圏向けニュースと研究紹介。".to_string(),
            limit: 10,
            icon_url: None,
            utc_offset_hours: None,
        },
        FeedSite {
            name: "Science Portal".to_string(),
            url: "https://scienceportal.jst.go.jp/feed/rss.xml".to_string(),
            description: "科学技術振興機構による科学ニュース全般。".to_string(),
            limit: 10,
            icon_url: None,
            utc_offset_hours: None,
        },
        FeedSite {
            name: "JSTAGE".to_string(),
            url: "https://www.jstage.jst.go.jp/AF02S010Download?cdRss=003&rssLang=ja".to_string(),
            description: "JSTAGEで直近に公開された学会誌の一覧です。当日分だけ出してますがあまりに数が多いので気が向いたやつだけ見てください・・・。".to_string(),
            limit: 20,
            icon_url: None,
            utc_offset_hours: Some(JST_OFFSET_HOURS),
        },
    ]
}

/// Reads a JSON array of site descriptors.
pub fn load_sites_file(path: &str) -> Result<Vec<FeedSite>> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| AggregatorError::Config(format!("Cannot read RSS_SITES_FILE {}: {}", path, e)))?;
    let sites: Vec<FeedSite> = serde_json::from_str(&content)?;
    info!("Loaded {} feed sites from {}", sites.len(), path);
    Ok(sites)
}

pub fn validate_sites(sites: &[FeedSite]) -> Result<()> {
    let mut names = HashSet::new();
    for site in sites {
        if site.name.trim().is_empty() {
            return Err(AggregatorError::Config(format!("Feed site with URL {} has no name", site.url)));
        }
        if !names.insert(site.name.as_str()) {
            return Err(AggregatorError::Config(format!("Duplicate feed site name: {}", site.name)));
        }
        if site.url.trim().is_empty() {
            return Err(AggregatorError::Config(format!("Feed site {} has an empty URL", site.name)));
        }
        let parsed = Url::parse(&site.url)?;
        if parsed.scheme() != "http" && parsed.scheme() != "https" {
            return Err(AggregatorError::Config(format!(
                "Feed site {} must use http or https, got {}",
                site.name,
                parsed.scheme()
            )));
        }
        if site.limit == 0 {
            return Err(AggregatorError::Config(format!("Feed site {} needs a positive limit", site.name)));
        }
        if let Some(hours) = site.utc_offset_hours {
            if !(-23..=23).contains(&hours) {
                return Err(AggregatorError::Config(format!(
                    "Feed site {} has an invalid UTC offset of {} hours",
                    site.name, hours
                )));
            }
        }
    }
    Ok(())
}

/// Cache windows must be positive and representable as a duration.
pub fn cache_minutes(key: &str, minutes: i64) -> Result<chrono::Duration> {
    if minutes <= 0 {
        return Err(AggregatorError::Config(format!("{} must be positive, got {}", key, minutes)));
    }
    chrono::Duration::try_minutes(minutes)
        .ok_or_else(|| AggregatorError::Config(format!("{} is out of range: {}", key, minutes)))
}

fn env_minutes(key: &str, default: i64) -> Result<chrono::Duration> {
    cache_minutes(key, env_number(key, default)?)
}

fn env_opt(key: &str) -> Option<String> {
    env::var(key).ok().map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

fn env_number<T: std::str::FromStr>(key: &str, default: T) -> Result<T> {
    match env_opt(key) {
        Some(raw) => raw
            .parse()
            .map_err(|_| AggregatorError::Config(format!("{} must be a number, got {:?}", key, raw))),
        None => Ok(default),
    }
}
