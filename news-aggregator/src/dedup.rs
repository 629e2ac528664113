use crate::types::Article;
use std::collections::HashSet;
use tracing::debug;

/// Link when the article has a real one, otherwise its title.
pub fn dedup_key(article: &Article) -> &str {
    if article.has_link() {
        &article.link
    } else {
        &article.title
    }
}

/// Concatenates `lists` in order, keeping only the first article per key.
pub fn merge<I>(lists: I) -> Vec<Article>
where
    I: IntoIterator<Item = Vec<Article>>,
{
    let mut seen = HashSet::new();
    let mut unique_articles = Vec::new();
    let mut removed_count = 0;

    for article in lists.into_iter().flatten() {
        if seen.insert(dedup_key(&article).to_string()) {
            unique_articles.push(article);
        } else {
            debug!("Removing duplicate article: {} ({})", article.title, article.link);
            removed_count += 1;
        }
    }

    if removed_count > 0 {
        debug!("Removed {} duplicate articles", removed_count);
    }
    unique_articles
}

pub fn dedup_articles(articles: Vec<Article>) -> Vec<Article> {
    merge([articles])
}

/// Keeps the first article for each title, for feeds that repost one
/// headline under several entry ids.
pub fn dedup_by_title(articles: Vec<Article>) -> Vec<Article> {
    let mut seen = HashSet::new();
    articles
        .into_iter()
        .filter(|article| seen.insert(article.title.clone()))
        .collect()
}
