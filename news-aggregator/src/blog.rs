use crate::types::{AggregatorError, BlogPost, NewPost, Result};
use async_trait::async_trait;
use chrono::Local;
use std::io::ErrorKind;
use std::path::PathBuf;
use tokio::sync::Mutex;
use tracing::{debug, info};

/// Persistence for the blog. The news core only ever reads `list_posts`.
#[async_trait]
pub trait BlogStore: Send + Sync {
    /// Newest first (highest id first).
    async fn list_posts(&self) -> Result<Vec<BlogPost>>;

    async fn get_post(&self, id: u64) -> Result<BlogPost>;

    async fn create_post(&self, post: NewPost) -> Result<BlogPost>;

    async fn update_post(&self, id: u64, post: NewPost) -> Result<BlogPost>;

    async fn delete_post(&self, id: u64) -> Result<()>;
}

/// Keeps every post in one pretty-printed JSON array.
pub struct JsonFileBlogStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonFileBlogStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    /// A missing file is an empty blog.
    async fn load(&self) -> Result<Vec<BlogPost>> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(content) if content.trim().is_empty() => Ok(Vec::new()),
            Ok(content) => Ok(serde_json::from_str(&content)?),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("Blog store {} does not exist yet", self.path.display());
                Ok(Vec::new())
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn save(&self, posts: &[BlogPost]) -> Result<()> {
        let body = serde_json::to_string_pretty(posts)?;
        let tmp_path = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp_path, body).await?;
        tokio::fs::rename(&tmp_path, &self.path).await?;
        Ok(())
    }
}

/// Splits a comma separated form field, dropping blanks.
pub fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn validate(post: &NewPost) -> Result<()> {
    if post.title.trim().is_empty() {
        return Err(AggregatorError::InvalidPost("Post title must not be empty".to_string()));
    }
    if post.content.trim().is_empty() {
        return Err(AggregatorError::InvalidPost("Post content must not be empty".to_string()));
    }
    Ok(())
}

#[async_trait]
impl BlogStore for JsonFileBlogStore {
    async fn list_posts(&self) -> Result<Vec<BlogPost>> {
        let mut posts = self.load().await?;
        posts.sort_by(|a, b| b.id.cmp(&a.id));
        Ok(posts)
    }

    async fn get_post(&self, id: u64) -> Result<BlogPost> {
        self.load()
            .await?
            .into_iter()
            .find(|post| post.id == id)
            .ok_or(AggregatorError::PostNotFound { id })
    }

    async fn create_post(&self, post: NewPost) -> Result<BlogPost> {
        validate(&post)?;
        let _guard = self.write_lock.lock().await;

        let mut posts = self.load().await?;
        let next_id = posts.iter().map(|p| p.id).max().map_or(1, |max| max + 1);

        let created = BlogPost {
            id: next_id,
            title: post.title.trim().to_string(),
            thumbnail: post.thumbnail.trim().to_string(),
            tags: split_list(&post.tags),
            images: split_list(&post.images),
            content: post.content,
            created_at: Local::now().naive_local(),
        };
        posts.push(created.clone());
        self.save(&posts).await?;

        info!("Created blog post {} ({})", created.id, created.title);
        Ok(created)
    }

    async fn update_post(&self, id: u64, post: NewPost) -> Result<BlogPost> {
        validate(&post)?;
        let _guard = self.write_lock.lock().await;

        let mut posts = self.load().await?;
        let existing = posts
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or(AggregatorError::PostNotFound { id })?;

        existing.title = post.title.trim().to_string();
        existing.thumbnail = post.thumbnail.trim().to_string();
        existing.tags = split_list(&post.tags);
        existing.images = split_list(&post.images);
        existing.content = post.content;
        let updated = existing.clone();

        self.save(&posts).await?;
        info!("Updated blog post {}", id);
        Ok(updated)
    }

    async fn delete_post(&self, id: u64) -> Result<()> {
        let _guard = self.write_lock.lock().await;

        let mut posts = self.load().await?;
        let before = posts.len();
        posts.retain(|p| p.id != id);
        if posts.len() == before {
            return Err(AggregatorError::PostNotFound { id });
        }

        self.save(&posts).await?;
        info!("Deleted blog post {}", id);
        Ok(())
    }
}
