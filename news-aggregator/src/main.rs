use anyhow::Context;
use chrono::Utc;
use clap::{Parser, Subcommand};
use news_aggregator::{create_router, AppConfig, AppState, JsonFileBlogStore, NewsAggregator, NewsCache};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "news-aggregator", about = "Cached news aggregation with a small blog")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Serve the JSON API (default)
    Serve,
    /// Run one refresh cycle and print the result
    Fetch,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let cli = Cli::parse();
    let config = AppConfig::from_env().context("invalid configuration")?;
    let aggregator = NewsAggregator::from_config(&config).context("failed to build HTTP client")?;

    match cli.command.unwrap_or(Command::Serve) {
        Command::Fetch => {
            let payload = aggregator.refresh(Utc::now()).await;
            println!("{}", serde_json::to_string_pretty(&payload)?);
        }
        Command::Serve => {
            info!("Starting news aggregator on {}", config.bind_addr);
            info!(
                "Feed sites: {}, blog store: {}",
                config.rss_sites.len(),
                config.blog_store_path.display()
            );

            let cache = NewsCache::with_ttl(aggregator, config.cache_ttl, config.cache_empty_ttl);
            let state = AppState {
                cache: Arc::new(cache),
                blog: Arc::new(JsonFileBlogStore::new(config.blog_store_path.clone())),
                admin_password: config.admin_password.as_deref().map(Arc::from),
            };

            let app = create_router(state);
            let listener = tokio::net::TcpListener::bind(&config.bind_addr)
                .await
                .with_context(|| format!("cannot bind {}", config.bind_addr))?;
            axum::serve(listener, app.into_make_service()).await?;
        }
    }

    Ok(())
}
