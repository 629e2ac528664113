use crate::blog::BlogStore;
use crate::cache::NewsCache;
use crate::markdown::render_markdown;
use crate::types::{AggregatorError, Article, BlogPost, NewPost, RssGroup};
use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;
use tracing::{error, warn};

pub const ADMIN_PASSWORD_HEADER: &str = "x-admin-password";

#[derive(Clone)]
pub struct AppState {
    pub cache: Arc<NewsCache>,
    pub blog: Arc<dyn BlogStore>,
    pub admin_password: Option<Arc<str>>,
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    BadRequest(String),

    #[error("admin password required")]
    Unauthorized,

    #[error("internal error: {0}")]
    Internal(String),
}

impl From<AggregatorError> for AppError {
    fn from(e: AggregatorError) -> Self {
        match e {
            AggregatorError::PostNotFound { id } => AppError::NotFound(format!("Post {} not found", id)),
            AggregatorError::InvalidPost(msg) => AppError::BadRequest(msg),
            other => AppError::Internal(other.to_string()),
        }
    }
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::Internal(msg) => {
                error!("Request failed: {}", msg);
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        (status, Json(ErrorResponse { error: self.to_string() })).into_response()
    }
}

pub type AppResult<T> = std::result::Result<T, AppError>;

/// Writes are refused outright when no password is configured.
pub fn check_admin(expected: Option<&str>, headers: &HeaderMap) -> AppResult<()> {
    let supplied = headers.get(ADMIN_PASSWORD_HEADER).and_then(|v| v.to_str().ok());
    match (expected, supplied) {
        (Some(expected), Some(supplied)) if expected == supplied => Ok(()),
        _ => Err(AppError::Unauthorized),
    }
}

#[derive(Debug, Serialize)]
pub struct IndexResponse {
    pub news: Vec<Article>,
    pub academic: Vec<Article>,
    pub subculture: Vec<Article>,
    pub rss: Vec<RssGroup>,
    pub refreshed_at: DateTime<Utc>,
    pub blog: Vec<BlogPost>,
}

/// A single post with its body rendered for display.
#[derive(Debug, Serialize)]
pub struct PostView {
    #[serde(flatten)]
    pub post: BlogPost,
    pub html_content: String,
}

impl From<BlogPost> for PostView {
    fn from(post: BlogPost) -> Self {
        let html_content = render_markdown(&post.content);
        Self { post, html_content }
    }
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/api/news", get(get_news))
        .route("/api/news/refresh", post(refresh_news))
        .route("/api/posts", get(list_posts).post(create_post))
        .route(
            "/api/posts/{id}",
            get(get_post).put(update_post).delete(delete_post),
        )
        .with_state(state)
}

/// News plus the blog listing. Never fails: a broken blog store only empties `blog`.
async fn get_news(State(state): State<AppState>) -> Json<IndexResponse> {
    let payload = state.cache.get_current(Utc::now()).await;
    let blog = match state.blog.list_posts().await {
        Ok(posts) => posts,
        Err(e) => {
            warn!("Blog store unavailable, serving news without posts: {}", e);
            Vec::new()
        }
    };

    Json(IndexResponse {
        news: payload.news.clone(),
        academic: payload.academic.clone(),
        subculture: payload.subculture.clone(),
        rss: payload.rss.clone(),
        refreshed_at: payload.refreshed_at,
        blog,
    })
}

async fn refresh_news(State(state): State<AppState>, headers: HeaderMap) -> AppResult<StatusCode> {
    check_admin(state.admin_password.as_deref(), &headers)?;
    state.cache.invalidate().await;
    Ok(StatusCode::NO_CONTENT)
}

async fn list_posts(State(state): State<AppState>) -> AppResult<Json<Vec<BlogPost>>> {
    Ok(Json(state.blog.list_posts().await?))
}

async fn get_post(State(state): State<AppState>, Path(id): Path<u64>) -> AppResult<Json<PostView>> {
    Ok(Json(state.blog.get_post(id).await?.into()))
}

async fn create_post(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(post): Json<NewPost>,
) -> AppResult<(StatusCode, Json<BlogPost>)> {
    check_admin(state.admin_password.as_deref(), &headers)?;
    let created = state.blog.create_post(post).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

async fn update_post(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<u64>,
    Json(post): Json<NewPost>,
) -> AppResult<Json<BlogPost>> {
    check_admin(state.admin_password.as_deref(), &headers)?;
    Ok(Json(state.blog.update_post(id, post).await?))
}

async fn delete_post(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<u64>,
) -> AppResult<StatusCode> {
    check_admin(state.admin_password.as_deref(), &headers)?;
    state.blog.delete_post(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
