pub mod brave;
pub mod rss_feed;
pub mod serper;

pub use brave::{BraveNewsSource, BraveQuery};
pub use rss_feed::RssSitesSource;
pub use serper::SerperSource;
