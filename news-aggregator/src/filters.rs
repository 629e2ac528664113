//! Noise filters applied to raw source items before normalization.

use chrono::{DateTime, Duration, FixedOffset, TimeZone, Utc};
use serde_json::Value;

/// Path and query fragments that mark index, tag, category or pagination pages.
pub const LISTING_PAGE_MARKERS: &[&str] = &[
    "/tag/",
    "/tags/",
    "/category/",
    "/categories/",
    "/archive/",
    "/archives/",
    "/page/",
    "?page=",
    "&page=",
    "/index.html",
    "/list/",
    "/search/",
    "/topics/",
];

/// Provenance names dropped from search results (aggregator reposts).
pub const EXCLUDED_SERPER_SOURCES: &[&str] = &["MSN"];

/// Publisher domains dropped from news-search results.
pub const EXCLUDED_BRAVE_PUBLISHERS: &[&str] = &["msn.com"];

/// Plain substring match; a URL is not parsed.
pub fn is_listing_page(url: &str) -> bool {
    LISTING_PAGE_MARKERS.iter().any(|marker| url.contains(marker))
}

/// `source`, falling back to `newsSource`.
pub fn serper_provenance(item: &Value) -> Option<&str> {
    non_empty_str(item, "source").or_else(|| non_empty_str(item, "newsSource"))
}

pub fn is_excluded_serper(item: &Value) -> bool {
    serper_provenance(item).is_some_and(|source| EXCLUDED_SERPER_SOURCES.contains(&source))
}

pub fn is_excluded_brave(item: &Value) -> bool {
    let excluded_publisher = item
        .get("publisher")
        .and_then(Value::as_str)
        .is_some_and(|publisher| EXCLUDED_BRAVE_PUBLISHERS.contains(&publisher));

    let listing = item
        .get("url")
        .and_then(Value::as_str)
        .is_some_and(is_listing_page);

    excluded_publisher || listing
}

/// Freshness check for feeds whose entries are only useful on the day they appear.
///
/// Undated entries are never fresh. The publish time is cut to its calendar
/// day as written by the feed (`offset`), and the entry is stale once `now`
/// is more than `max_age` past the start of that day.
pub fn is_fresh_entry(
    published: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
    offset: FixedOffset,
    max_age: Duration,
) -> bool {
    let Some(published) = published else {
        return false;
    };
    let day_start = published
        .with_timezone(&offset)
        .date_naive()
        .and_hms_opt(0, 0, 0)
        .and_then(|naive| offset.from_local_datetime(&naive).single())
        .map(|start| start.with_timezone(&Utc))
        .unwrap_or(published);
    now.signed_duration_since(day_start) <= max_age
}

pub(crate) fn non_empty_str<'a>(item: &'a Value, field: &str) -> Option<&'a str> {
    item.get(field)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
}
