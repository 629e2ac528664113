use crate::types::{AggregatorError, ParsedEntry, ParsedFeed, Result};
use feed_rs::parser;
use tracing::debug;

/// Thin wrapper over `feed_rs` that keeps only the fields the adapters read.
#[derive(Default)]
pub struct FeedParser;

impl FeedParser {
    pub fn new() -> Self {
        Self
    }

    pub fn parse_feed(&self, content: &str) -> Result<ParsedFeed> {
        debug!("Parsing feed content ({} bytes)", content.len());

        let feed = parser::parse(content.as_bytes())
            .map_err(|e| AggregatorError::Parse(format!("Failed to parse feed: {}", e)))?;

        let entries: Vec<ParsedEntry> = feed.entries.into_iter().map(Self::parse_entry).collect();

        debug!("Parsed feed with {} entries", entries.len());
        Ok(ParsedFeed { entries })
    }

    fn parse_entry(entry: feed_rs::model::Entry) -> ParsedEntry {
        let title = entry
            .title
            .map(|t| t.content.trim().to_string())
            .filter(|t| !t.is_empty());

        // A single `<link>` and a list of link objects both land in `links`.
        let link = entry
            .links
            .first()
            .map(|l| l.href.trim().to_string())
            .filter(|href| !href.is_empty());

        let author = entry
            .authors
            .first()
            .map(|a| a.name.trim().to_string())
            .filter(|name| !name.is_empty());

        ParsedEntry {
            title,
            link,
            author,
            published: entry.published.or(entry.updated),
        }
    }

    /// XML feeds are sniffed by their root elements; JSON Feed by a leading object.
    pub fn is_valid_feed_content(content: &str) -> bool {
        if content.trim_start().starts_with('{') {
            return true;
        }
        let content_lower = content.to_lowercase();
        content_lower.contains("<rss")
            || content_lower.contains("<feed")
            || content_lower.contains("<rdf:rdf")
            || content_lower.contains("<channel")
    }
}
