pub mod types;
pub mod config;
pub mod fetcher;
pub mod parser;
pub mod filters;
pub mod normalize;
pub mod dedup;
pub mod traits;
pub mod sources;
pub mod aggregator;
pub mod cache;
pub mod blog;
pub mod markdown;
pub mod server;

pub use types::*;
pub use config::AppConfig;
pub use fetcher::Fetcher;
pub use parser::FeedParser;
pub use traits::{PullFeedGroups, PullNews};
pub use sources::{BraveNewsSource, RssSitesSource, SerperSource};
pub use aggregator::NewsAggregator;
pub use cache::NewsCache;
pub use blog::{BlogStore, JsonFileBlogStore};
pub use markdown::render_markdown;
pub use server::{create_router, AppState, PostView};
