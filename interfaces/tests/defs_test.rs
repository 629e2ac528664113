use chrono::Utc;
use interfaces::{Article, NewsPayload, RssGroup, PLACEHOLDER_LINK, PLACEHOLDER_TITLE};

#[test]
fn test_article_defaults_blank_fields() {
    let article = Article::new(None, Some("   "), "Brave");
    assert_eq!(article.title, PLACEHOLDER_TITLE);
    assert_eq!(article.link, PLACEHOLDER_LINK);
    assert_eq!(article.source, "Brave");
    assert!(!article.has_link());

    let article = Article::new(Some(" 特別展 "), Some("https://a.example/1"), "X");
    assert_eq!(article.title, "特別展");
    assert!(article.has_link());
}

#[test]
fn test_payload_emptiness_counts_feed_groups() {
    let mut payload = NewsPayload::empty(Utc::now());
    payload.rss.push(RssGroup {
        site_name: "Nature Asia".to_owned(),
        description: String::new(),
        icon_url: None,
        articles: Vec::new(),
    });
    assert!(payload.is_empty());

    payload.rss[0].articles.push(Article::new(Some("t"), None, "Nature Asia"));
    assert!(!payload.is_empty());
}

#[test]
fn test_article_omits_missing_published_in_json() {
    let article = Article::new(Some("t"), Some("http://a"), "X");
    let json = serde_json::to_value(&article).unwrap();
    assert!(json.get("published").is_none());
    assert_eq!(json["link"], "http://a");
}
