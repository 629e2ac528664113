use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

/// Title used when a source omits one.
pub const PLACEHOLDER_TITLE: &str = "無題";

/// Link used when a source omits one.
pub const PLACEHOLDER_LINK: &str = "#";

/// A normalized news item. Every adapter produces this shape and nothing else.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Article {
    pub title: String,
    pub link: String,
    pub source: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published: Option<DateTime<Utc>>,
}

impl Article {
    /// Builds an article, substituting placeholders for blank fields.
    pub fn new(title: Option<&str>, link: Option<&str>, source: &str) -> Self {
        let title = title
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .unwrap_or(PLACEHOLDER_TITLE);
        let link = link
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .unwrap_or(PLACEHOLDER_LINK);
        Self {
            title: title.to_owned(),
            link: link.to_owned(),
            source: source.to_owned(),
            published: None,
        }
    }

    pub fn with_published(mut self, published: Option<DateTime<Utc>>) -> Self {
        self.published = published;
        self
    }

    pub fn has_link(&self) -> bool {
        !self.link.is_empty() && self.link != PLACEHOLDER_LINK
    }
}

/// One configured feed site and the articles it yielded in a refresh cycle.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RssGroup {
    pub site_name: String,
    pub description: String,
    pub icon_url: Option<String>,
    pub articles: Vec<Article>,
}

/// Everything one refresh cycle produced.
///
/// `news` is `academic` followed by `subculture` with duplicates removed.
/// Feed groups are never folded into it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewsPayload {
    pub academic: Vec<Article>,
    pub subculture: Vec<Article>,
    pub news: Vec<Article>,
    pub rss: Vec<RssGroup>,
    pub refreshed_at: DateTime<Utc>,
}

impl NewsPayload {
    pub fn empty(refreshed_at: DateTime<Utc>) -> Self {
        Self {
            academic: Vec::new(),
            subculture: Vec::new(),
            news: Vec::new(),
            rss: Vec::new(),
            refreshed_at,
        }
    }

    /// True when no category, including every feed group, has an article.
    pub fn is_empty(&self) -> bool {
        self.academic.is_empty()
            && self.subculture.is_empty()
            && self.rss.iter().all(|group| group.articles.is_empty())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlogPost {
    pub id: u64,
    pub title: String,
    #[serde(default)]
    pub thumbnail: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub images: Vec<String>,
    pub content: String,
    pub created_at: NaiveDateTime,
}

/// Fields an admin submits when creating or editing a post.
/// `tags` and `images` arrive comma separated.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct NewPost {
    pub title: String,
    #[serde(default)]
    pub thumbnail: String,
    #[serde(default)]
    pub tags: String,
    #[serde(default)]
    pub images: String,
    pub content: String,
}

// Object style note:
// These are plain values handed between the aggregator, the blog store and
// the HTTP layer. None of them carry behaviour beyond defaulting, so any
// component can construct them without pulling in I/O dependencies.
