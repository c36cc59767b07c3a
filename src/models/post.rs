use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

use crate::models::comment::CommentResponse;

/// Represents the 'blog_posts' table in the database.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Post {
    pub id: i64,
    pub author_id: i64,
    pub title: String,
    pub subtitle: String,

    /// Human-readable creation date, e.g. "April 05, 2024". Never updated.
    pub date: String,

    /// Sanitised rich-text HTML.
    pub body: String,
    pub img_url: String,
}

/// A post joined with its author's display name, as listed on the index.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct PostSummary {
    pub id: i64,
    pub author_id: i64,
    pub author_name: String,
    pub title: String,
    pub subtitle: String,
    pub date: String,
    pub img_url: String,
}

/// A single post with author and comments.
#[derive(Debug, Serialize)]
pub struct PostDetail {
    #[serde(flatten)]
    pub post: Post,
    pub author_name: String,
    pub comments: Vec<CommentResponse>,
}

/// Upper bound on a stored post body, after sanitising.
pub const MAX_BODY_LEN: usize = 2000;

/// DTO for creating or editing a post. Edits replace all four fields.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct PostForm {
    #[validate(length(
        min = 1,
        max = 250,
        message = "Title length must be between 1 and 250 chars"
    ))]
    pub title: String,

    #[validate(length(
        min = 1,
        max = 250,
        message = "Subtitle length must be between 1 and 250 chars"
    ))]
    pub subtitle: String,

    #[validate(length(
        min = 1,
        max = 2000,
        message = "Body length must be between 1 and 2000 chars"
    ))]
    pub body: String,

    #[validate(
        url(message = "Image URL must be a valid URL"),
        length(max = 250, message = "Image URL must be at most 250 chars")
    )]
    pub img_url: String,
}

impl PostForm {
    /// Copy with surrounding whitespace removed from every field, so the
    /// length rules see what will be stored.
    pub fn trimmed(&self) -> Self {
        Self {
            title: self.title.trim().to_string(),
            subtitle: self.subtitle.trim().to_string(),
            body: self.body.trim().to_string(),
            img_url: self.img_url.trim().to_string(),
        }
    }
}

impl From<&Post> for PostForm {
    fn from(post: &Post) -> Self {
        Self {
            title: post.title.clone(),
            subtitle: post.subtitle.clone(),
            body: post.body.clone(),
            img_url: post.img_url.clone(),
        }
    }
}
