//! Total conversions from loosely shaped API items to [`Article`].
//!
//! Raw JSON never leaves the adapter that fetched it; these functions are
//! the boundary. Missing or mistyped fields fall back to placeholders.

use crate::filters::{non_empty_str, serper_provenance};
use crate::types::Article;
use serde_json::Value;

pub const SERPER_DEFAULT_SOURCE: &str = "Serper";
pub const BRAVE_DEFAULT_SOURCE: &str = "Brave";

pub fn normalize_serper(item: &Value) -> Article {
    Article::new(
        non_empty_str(item, "title"),
        non_empty_str(item, "link"),
        serper_provenance(item).unwrap_or(SERPER_DEFAULT_SOURCE),
    )
}

pub fn normalize_brave(item: &Value) -> Article {
    let hostname = item
        .get("meta_url")
        .and_then(|meta| non_empty_str(meta, "hostname"));

    Article::new(
        non_empty_str(item, "title"),
        non_empty_str(item, "url"),
        hostname.unwrap_or(BRAVE_DEFAULT_SOURCE),
    )
}

/// The search API answers under `news` for news queries and `organic` otherwise.
pub fn serper_items(response: &Value) -> &[Value] {
    response
        .get("news")
        .and_then(Value::as_array)
        .or_else(|| response.get("organic").and_then(Value::as_array))
        .map(Vec::as_slice)
        .unwrap_or(&[])
}

pub fn brave_items(response: &Value) -> &[Value] {
    response
        .get("results")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or(&[])
}
