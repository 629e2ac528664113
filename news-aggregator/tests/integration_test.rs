use async_trait::async_trait;
use axum::body::{to_bytes, Body};
use axum::http::{HeaderMap, HeaderValue, Method, Request, StatusCode};
use axum::response::IntoResponse;
use axum::Router;
use chrono::{DateTime, Duration, TimeZone, Utc};
use news_aggregator::{
    server::{check_admin, AppError, ADMIN_PASSWORD_HEADER},
    types::*,
    create_router, render_markdown, AppState, BlogStore, JsonFileBlogStore, NewsAggregator, NewsCache, PullFeedGroups, PullNews,
};
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Once};
use serde_json::Value;
use tower::ServiceExt;
use tracing::info;
use uuid::Uuid;

static INIT: Once = Once::new();

fn init_tracing() {
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_max_level(tracing::Level::INFO)
            .try_init()
            .ok();
    });
}

fn start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 10, 18, 9, 0, 0).unwrap()
}

enum Behaviour {
    Articles(Vec<Article>),
    Fail,
    Hang,
}

struct FakeNews {
    name: &'static str,
    behaviour: Behaviour,
    calls: Arc<AtomicUsize>,
}

impl FakeNews {
    fn new(name: &'static str, behaviour: Behaviour) -> (Self, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        (Self { name, behaviour, calls: calls.clone() }, calls)
    }
}

#[async_trait]
impl PullNews for FakeNews {
    fn source_id(&self) -> String {
        self.name.to_lowercase()
    }

    fn source_name(&self) -> String {
        self.name.to_string()
    }

    async fn try_pull(&self, _now: DateTime<Utc>) -> Result<Vec<Article>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        // a short await so concurrent callers overlap
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        match &self.behaviour {
            Behaviour::Articles(articles) => Ok(articles.clone()),
            Behaviour::Fail => Err(AggregatorError::General("HTTP 503: Service Unavailable".to_string())),
            Behaviour::Hang => {
                tokio::time::sleep(std::time::Duration::from_secs(30)).await;
                Ok(Vec::new())
            }
        }
    }
}

struct FakeFeeds {
    groups: Vec<RssGroup>,
    calls: Arc<AtomicUsize>,
}

#[async_trait]
impl PullFeedGroups for FakeFeeds {
    fn source_name(&self) -> String {
        "Fake feeds".to_string()
    }

    async fn pull_groups(&self, _now: DateTime<Utc>, _timeout: std::time::Duration) -> Vec<RssGroup> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.groups.clone()
    }
}

fn article(title: &str, link: &str, source: &str) -> Article {
    Article::new(Some(title), Some(link), source)
}

struct Counters {
    academic: Arc<AtomicUsize>,
    subculture: Arc<AtomicUsize>,
    rss: Arc<AtomicUsize>,
}

impl Counters {
    fn all(&self) -> [usize; 3] {
        [
            self.academic.load(Ordering::SeqCst),
            self.subculture.load(Ordering::SeqCst),
            self.rss.load(Ordering::SeqCst),
        ]
    }
}

fn build_aggregator(academic: Behaviour, subculture: Behaviour, groups: Vec<RssGroup>) -> (NewsAggregator, Counters) {
    let (academic, academic_calls) = FakeNews::new("Academic", academic);
    let (subculture, subculture_calls) = FakeNews::new("Subculture", subculture);
    let rss_calls = Arc::new(AtomicUsize::new(0));
    let feeds = FakeFeeds { groups, calls: rss_calls.clone() };

    let aggregator = NewsAggregator::new(
        Box::new(academic),
        Box::new(subculture),
        Box::new(feeds),
        std::time::Duration::from_millis(500),
    );
    let counters = Counters {
        academic: academic_calls,
        subculture: subculture_calls,
        rss: rss_calls,
    };
    (aggregator, counters)
}

fn sample_group() -> RssGroup {
    RssGroup {
        site_name: "ナゾロジー".to_string(),
        description: "科学ニュース".to_string(),
        icon_url: Some("nazology.png".to_string()),
        articles: vec![article("Feed story", "http://a", "ナゾロジー")],
    }
}

fn default_aggregator() -> (NewsAggregator, Counters) {
    build_aggregator(
        Behaviour::Articles(vec![article("S1", "http://a", "X"), article("S2", "http://b", "X")]),
        Behaviour::Articles(vec![article("B1", "http://a", "Y"), article("B2", "http://c", "Y")]),
        vec![sample_group()],
    )
}

#[tokio::test]
async fn test_refresh_merges_only_api_categories() {
    init_tracing();
    let (aggregator, _) = default_aggregator();

    let payload = aggregator.refresh(start()).await;

    assert_eq!(payload.academic.len(), 2);
    assert_eq!(payload.subculture.len(), 2);
    let links: Vec<&str> = payload.news.iter().map(|a| a.link.as_str()).collect();
    assert_eq!(links, vec!["http://a", "http://b", "http://c"]);
    assert_eq!(payload.news[0].source, "X");
    // the feed article shares a link with the API results but stays in its group
    assert_eq!(payload.rss, vec![sample_group()]);
    assert_eq!(payload.refreshed_at, start());
}

#[tokio::test]
async fn test_cache_hit_within_window() {
    init_tracing();
    let (aggregator, counters) = default_aggregator();
    let cache = NewsCache::new(aggregator);

    let first = cache.get_current(start()).await;
    let second = cache.get_current(start() + Duration::minutes(29)).await;

    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(counters.all(), [1, 1, 1]);
    assert_eq!(cache.last_refreshed().await, Some(start()));
}

#[tokio::test]
async fn test_cache_refreshes_after_window() {
    let (aggregator, counters) = default_aggregator();
    let cache = NewsCache::new(aggregator);

    let first = cache.get_current(start()).await;
    let second = cache.get_current(start() + Duration::minutes(30)).await;

    assert!(!Arc::ptr_eq(&first, &second));
    assert_eq!(counters.all(), [2, 2, 2]);
    assert_eq!(second.refreshed_at, start() + Duration::minutes(30));
}

#[tokio::test]
async fn test_cache_invalidate_forces_refresh() {
    let (aggregator, counters) = default_aggregator();
    let cache = NewsCache::new(aggregator);

    cache.get_current(start()).await;
    cache.invalidate().await;
    cache.get_current(start() + Duration::minutes(1)).await;

    assert_eq!(counters.all(), [2, 2, 2]);
}

#[tokio::test]
async fn test_concurrent_callers_share_one_refresh() {
    init_tracing();
    let (aggregator, counters) = default_aggregator();
    let cache = Arc::new(NewsCache::new(aggregator));

    let (a, b) = tokio::join!(cache.get_current(start()), cache.get_current(start()));

    assert!(Arc::ptr_eq(&a, &b));
    assert_eq!(counters.all(), [1, 1, 1]);
}

#[tokio::test]
async fn test_failed_adapter_contributes_empty_list() {
    init_tracing();
    let (aggregator, counters) = build_aggregator(
        Behaviour::Fail,
        Behaviour::Articles(vec![article("B1", "http://c", "Y")]),
        vec![sample_group()],
    );

    let payload = aggregator.refresh(start()).await;

    assert!(payload.academic.is_empty());
    assert_eq!(payload.subculture.len(), 1);
    assert_eq!(payload.news.len(), 1);
    assert_eq!(payload.rss.len(), 1);
    assert_eq!(counters.all(), [1, 1, 1]);
}

#[tokio::test]
async fn test_hanging_adapter_times_out_as_empty() {
    let (aggregator, _) = build_aggregator(
        Behaviour::Hang,
        Behaviour::Articles(vec![article("B1", "http://c", "Y")]),
        Vec::new(),
    );

    let started = std::time::Instant::now();
    let payload = aggregator.refresh(start()).await;

    assert!(started.elapsed() < std::time::Duration::from_secs(5));
    assert!(payload.academic.is_empty());
    assert_eq!(payload.subculture.len(), 1);
}

#[tokio::test]
async fn test_all_failed_payload_retries_sooner() {
    init_tracing();
    let (aggregator, counters) = build_aggregator(Behaviour::Fail, Behaviour::Fail, Vec::new());
    let cache = NewsCache::new(aggregator);

    let first = cache.get_current(start()).await;
    assert!(first.is_empty());

    cache.get_current(start() + Duration::minutes(4)).await;
    assert_eq!(counters.all(), [1, 1, 1]);

    cache.get_current(start() + Duration::minutes(6)).await;
    assert_eq!(counters.all(), [2, 2, 2]);
}

#[tokio::test]
async fn test_all_failed_payload_can_keep_full_window() {
    let (aggregator, counters) = build_aggregator(Behaviour::Fail, Behaviour::Fail, Vec::new());
    let cache = NewsCache::with_ttl(aggregator, Duration::minutes(30), Duration::minutes(30));

    cache.get_current(start()).await;
    cache.get_current(start() + Duration::minutes(20)).await;

    assert_eq!(counters.all(), [1, 1, 1]);
}

fn temp_blog_path() -> PathBuf {
    std::env::temp_dir().join(format!("news-aggregator-blog-{}.json", Uuid::new_v4()))
}

fn new_post(title: &str) -> NewPost {
    NewPost {
        title: title.to_string(),
        thumbnail: String::new(),
        tags: " 展示, ,SF ".to_string(),
        images: "a.png,b.png".to_string(),
        content: "# 見出し\n本文".to_string(),
    }
}

#[tokio::test]
async fn test_blog_store_crud() {
    init_tracing();
    let path = temp_blog_path();
    let store = JsonFileBlogStore::new(&path);

    assert!(store.list_posts().await.unwrap().is_empty());

    let first = store.create_post(new_post("First")).await.unwrap();
    let second = store.create_post(new_post("Second")).await.unwrap();
    assert_eq!(first.id, 1);
    assert_eq!(second.id, 2);
    assert_eq!(first.tags, vec!["展示", "SF"]);
    assert_eq!(first.images, vec!["a.png", "b.png"]);

    let listed: Vec<u64> = store.list_posts().await.unwrap().iter().map(|p| p.id).collect();
    assert_eq!(listed, vec![2, 1]);

    let mut edit = new_post("First, edited");
    edit.tags = String::new();
    let updated = store.update_post(1, edit).await.unwrap();
    assert_eq!(updated.title, "First, edited");
    assert!(updated.tags.is_empty());
    assert_eq!(updated.created_at, first.created_at);

    store.delete_post(2).await.unwrap();
    assert!(matches!(store.get_post(2).await, Err(AggregatorError::PostNotFound { id: 2 })));

    // ids keep growing from the current maximum
    let third = store.create_post(new_post("Third")).await.unwrap();
    assert_eq!(third.id, 2);

    // a second store over the same file sees the persisted state
    let reopened = JsonFileBlogStore::new(&path);
    assert_eq!(reopened.list_posts().await.unwrap().len(), 2);
    info!("Blog store file: {}", path.display());

    std::fs::remove_file(&path).ok();
}

#[tokio::test]
async fn test_blog_store_rejects_blank_posts() {
    let path = temp_blog_path();
    let store = JsonFileBlogStore::new(&path);

    let mut post = new_post("   ");
    assert!(matches!(store.create_post(post.clone()).await, Err(AggregatorError::InvalidPost(_))));

    post.title = "ok".to_string();
    post.content = String::new();
    assert!(store.create_post(post).await.is_err());
    assert!(matches!(store.delete_post(9).await, Err(AggregatorError::PostNotFound { id: 9 })));
}

#[test]
fn test_admin_check() {
    let mut headers = HeaderMap::new();
    assert!(check_admin(Some("secret"), &headers).is_err());

    headers.insert(ADMIN_PASSWORD_HEADER, HeaderValue::from_static("wrong"));
    assert!(check_admin(Some("secret"), &headers).is_err());

    headers.insert(ADMIN_PASSWORD_HEADER, HeaderValue::from_static("secret"));
    assert!(check_admin(Some("secret"), &headers).is_ok());
    // no configured password means no writes at all
    assert!(check_admin(None, &headers).is_err());
}

#[test]
fn test_error_status_mapping() {
    let not_found: AppError = AggregatorError::PostNotFound { id: 3 }.into();
    assert_eq!(not_found.into_response().status(), StatusCode::NOT_FOUND);

    let invalid: AppError = AggregatorError::InvalidPost("empty".to_string()).into();
    assert_eq!(invalid.into_response().status(), StatusCode::BAD_REQUEST);

    assert_eq!(AppError::Unauthorized.into_response().status(), StatusCode::UNAUTHORIZED);

    let io: AppError = AggregatorError::General("disk full".to_string()).into();
    assert_eq!(io.into_response().status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[test]
fn test_markdown_rendering() {
    let html = render_markdown("# 見出し\n一行目\n二行目");
    assert!(html.contains("<h1>見出し</h1>"));
    assert!(html.contains("一行目<br />"));
    assert!(html.contains("二行目"));

    let table = render_markdown("| a | b |\n|---|---|\n| 1 | 2 |");
    assert!(table.contains("<table>"));
    assert!(table.contains("<td>1</td>"));
}

fn router_with_blog(path: &PathBuf) -> (Router, Counters) {
    let (aggregator, counters) = default_aggregator();
    let state = AppState {
        cache: Arc::new(NewsCache::new(aggregator)),
        blog: Arc::new(JsonFileBlogStore::new(path)),
        admin_password: Some(Arc::from("secret")),
    };
    (create_router(state), counters)
}

fn request(method: Method, uri: &str, password: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(password) = password {
        builder = builder.header(ADMIN_PASSWORD_HEADER, password);
    }
    builder.body(Body::empty()).unwrap()
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_news_route_survives_corrupt_blog_store() {
    init_tracing();
    let path = temp_blog_path();
    std::fs::write(&path, "{ this is not a post list").unwrap();
    let (app, counters) = router_with_blog(&path);

    let response = app.oneshot(request(Method::GET, "/api/news", None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["blog"], Value::Array(Vec::new()));
    assert_eq!(body["news"].as_array().map(Vec::len), Some(3));
    assert_eq!(body["rss"][0]["site_name"], "ナゾロジー");
    assert_eq!(counters.all(), [1, 1, 1]);

    std::fs::remove_file(&path).ok();
}

#[tokio::test]
async fn test_refresh_route_requires_admin_password() {
    let path = temp_blog_path();
    let (app, counters) = router_with_blog(&path);

    let response = app.clone().oneshot(request(Method::GET, "/api/news", None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let missing = app.clone().oneshot(request(Method::POST, "/api/news/refresh", None)).await.unwrap();
    assert_eq!(missing.status(), StatusCode::UNAUTHORIZED);
    let wrong = app
        .clone()
        .oneshot(request(Method::POST, "/api/news/refresh", Some("guess")))
        .await
        .unwrap();
    assert_eq!(wrong.status(), StatusCode::UNAUTHORIZED);

    // rejected refreshes leave the cached payload alone
    app.clone().oneshot(request(Method::GET, "/api/news", None)).await.unwrap();
    assert_eq!(counters.all(), [1, 1, 1]);

    let accepted = app
        .clone()
        .oneshot(request(Method::POST, "/api/news/refresh", Some("secret")))
        .await
        .unwrap();
    assert_eq!(accepted.status(), StatusCode::NO_CONTENT);

    app.oneshot(request(Method::GET, "/api/news", None)).await.unwrap();
    assert_eq!(counters.all(), [2, 2, 2]);
}

#[tokio::test]
async fn test_post_route_renders_markdown() {
    let path = temp_blog_path();
    let store = JsonFileBlogStore::new(&path);
    let created = store.create_post(new_post("Rendered")).await.unwrap();
    let (app, _) = router_with_blog(&path);

    let uri = format!("/api/posts/{}", created.id);
    let response = app.clone().oneshot(request(Method::GET, &uri, None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["title"], "Rendered");
    assert_eq!(body["content"], "# 見出し\n本文");
    assert_eq!(body["html_content"], "<h1>見出し</h1>\n<p>本文</p>\n");

    let missing = app.oneshot(request(Method::GET, "/api/posts/99", None)).await.unwrap();
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);

    std::fs::remove_file(&path).ok();
}
