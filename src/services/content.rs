// src/services/content.rs

use sqlx::SqlitePool;
use validator::Validate;

use crate::{
    error::{AppError, is_unique_violation},
    models::{
        comment::{Comment, CommentResponse, CreateCommentRequest},
        post::{MAX_BODY_LEN, Post, PostDetail, PostForm, PostSummary},
        user::User,
    },
    services::auth::require_user,
    session::Session,
    utils::html::sanitize_post_body,
};

const POST_COLUMNS: &str = "id, author_id, title, subtitle, date, body, img_url";

/// Creation date as shown on the post, e.g. "April 05, 2024".
pub fn format_post_date(date: chrono::NaiveDate) -> String {
    date.format("%B %d, %Y").to_string()
}

/// Sanitised body, checked against the cap after cleaning.
fn clean_body(body: &str) -> Result<String, AppError> {
    let cleaned = sanitize_post_body(body);
    let len = cleaned.chars().count();
    if len == 0 || len > MAX_BODY_LEN {
        return Err(AppError::BadRequest(format!(
            "Body length must be between 1 and {} chars after sanitising",
            MAX_BODY_LEN
        )));
    }
    Ok(cleaned)
}

fn title_conflict(e: sqlx::Error) -> AppError {
    if is_unique_violation(&e) {
        AppError::DuplicateTitle
    } else {
        tracing::error!("Failed to write post: {:?}", e);
        AppError::from(e)
    }
}

async fn title_taken(
    pool: &SqlitePool,
    title: &str,
    except_id: Option<i64>,
) -> Result<bool, AppError> {
    let row: Option<(i64,)> = sqlx::query_as(
        "SELECT id FROM blog_posts WHERE title = ? AND (? IS NULL OR id != ?)",
    )
    .bind(title)
    .bind(except_id)
    .bind(except_id)
    .fetch_optional(pool)
    .await?;
    Ok(row.is_some())
}

async fn find_post(pool: &SqlitePool, id: i64) -> Result<Post, AppError> {
    sqlx::query_as::<_, Post>(&format!("SELECT {POST_COLUMNS} FROM blog_posts WHERE id = ?"))
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Post {} not found", id)))
}

/// Loads the post and checks that the acting identity wrote it.
async fn authored_post(
    pool: &SqlitePool,
    session: &Session,
    id: i64,
    action: &str,
) -> Result<(User, Post), AppError> {
    let identity = require_user(
        pool,
        session,
        &format!("You need to log in to {} a post", action),
    )
    .await?;
    let post = find_post(pool, id).await?;

    if post.author_id != identity.id {
        tracing::warn!(
            user_id = identity.id,
            post_id = id,
            "Refused to {} another author's post",
            action
        );
        return Err(AppError::Forbidden(format!(
            "Only the author can {} this post",
            action
        )));
    }

    Ok((identity, post))
}

/// All posts in insertion order, with author names.
pub async fn list_posts(pool: &SqlitePool) -> Result<Vec<PostSummary>, AppError> {
    let posts = sqlx::query_as::<_, PostSummary>(
        r#"
        SELECT p.id, p.author_id, u.name AS author_name,
               p.title, p.subtitle, p.date, p.img_url
        FROM blog_posts p
        JOIN users u ON u.id = p.author_id
        ORDER BY p.id
        "#,
    )
    .fetch_all(pool)
    .await?;
    Ok(posts)
}

/// A single post with its author and comments.
pub async fn get_post(pool: &SqlitePool, id: i64) -> Result<PostDetail, AppError> {
    let post = find_post(pool, id).await?;

    let (author_name,): (String,) = sqlx::query_as("SELECT name FROM users WHERE id = ?")
        .bind(post.author_id)
        .fetch_one(pool)
        .await?;

    let comments = sqlx::query_as::<_, CommentResponse>(
        r#"
        SELECT c.id, c.post_id, c.author_id, u.name AS author_name, c.text
        FROM comments c
        JOIN users u ON u.id = c.author_id
        WHERE c.post_id = ?
        ORDER BY c.id
        "#,
    )
    .bind(id)
    .fetch_all(pool)
    .await?;

    Ok(PostDetail {
        post,
        author_name,
        comments,
    })
}

/// Current field values of a post the session may edit.
pub async fn edit_form(pool: &SqlitePool, session: &Session, id: i64) -> Result<PostForm, AppError> {
    let (_, post) = authored_post(pool, session, id, "edit").await?;
    Ok(PostForm::from(&post))
}

/// Creates a post authored by the session's identity, dated today.
pub async fn create_post(
    pool: &SqlitePool,
    session: &Session,
    form: &PostForm,
) -> Result<Post, AppError> {
    let identity = require_user(pool, session, "You need to log in to create a post").await?;
    let form = form.trimmed();
    form.validate()?;
    let body = clean_body(&form.body)?;

    let title = form.title.as_str();
    if title_taken(pool, title, None).await? {
        return Err(AppError::DuplicateTitle);
    }

    let date = format_post_date(chrono::Local::now().date_naive());

    let post = sqlx::query_as::<_, Post>(&format!(
        r#"
        INSERT INTO blog_posts (author_id, title, subtitle, date, body, img_url)
        VALUES (?, ?, ?, ?, ?, ?)
        RETURNING {POST_COLUMNS}
        "#
    ))
    .bind(identity.id)
    .bind(title)
    .bind(&form.subtitle)
    .bind(&date)
    .bind(&body)
    .bind(&form.img_url)
    .fetch_one(pool)
    .await
    .map_err(title_conflict)?;

    tracing::info!(post_id = post.id, user_id = identity.id, "Created post");
    Ok(post)
}

/// Replaces title, subtitle, body and image. Author and date never change.
pub async fn edit_post(
    pool: &SqlitePool,
    session: &Session,
    id: i64,
    form: &PostForm,
) -> Result<Post, AppError> {
    let (identity, _) = authored_post(pool, session, id, "edit").await?;
    let form = form.trimmed();
    form.validate()?;
    let body = clean_body(&form.body)?;

    let title = form.title.as_str();
    if title_taken(pool, title, Some(id)).await? {
        return Err(AppError::DuplicateTitle);
    }

    let post = sqlx::query_as::<_, Post>(&format!(
        r#"
        UPDATE blog_posts
        SET title = ?, subtitle = ?, body = ?, img_url = ?
        WHERE id = ?
        RETURNING {POST_COLUMNS}
        "#
    ))
    .bind(title)
    .bind(&form.subtitle)
    .bind(&body)
    .bind(&form.img_url)
    .bind(id)
    .fetch_optional(pool)
    .await
    .map_err(title_conflict)?
    .ok_or_else(|| AppError::NotFound(format!("Post {} not found", id)))?;

    tracing::info!(post_id = id, user_id = identity.id, "Edited post");
    Ok(post)
}

/// Hard-deletes a post together with its comments.
pub async fn delete_post(pool: &SqlitePool, session: &Session, id: i64) -> Result<(), AppError> {
    let (identity, _) = authored_post(pool, session, id, "delete").await?;

    let mut tx = pool.begin().await?;

    sqlx::query("DELETE FROM comments WHERE post_id = ?")
        .bind(id)
        .execute(&mut *tx)
        .await?;

    sqlx::query("DELETE FROM blog_posts WHERE id = ?")
        .bind(id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;

    tracing::info!(post_id = id, user_id = identity.id, "Deleted post");
    Ok(())
}

/// Attaches a comment by the session's identity to an existing post.
pub async fn add_comment(
    pool: &SqlitePool,
    session: &Session,
    post_id: i64,
    form: &CreateCommentRequest,
) -> Result<Comment, AppError> {
    let identity = require_user(pool, session, "You need to log in to comment").await?;
    form.validate()?;

    let text = form.text.trim();
    if text.is_empty() {
        return Err(AppError::BadRequest("Comment must not be blank".to_string()));
    }

    // Surfaces NotFound instead of a foreign-key failure.
    find_post(pool, post_id).await?;

    let comment = sqlx::query_as::<_, Comment>(
        r#"
        INSERT INTO comments (text, author_id, post_id)
        VALUES (?, ?, ?)
        RETURNING id, post_id, author_id, text
        "#,
    )
    .bind(text)
    .bind(identity.id)
    .bind(post_id)
    .fetch_one(pool)
    .await?;

    tracing::info!(comment_id = comment.id, post_id, user_id = identity.id, "Added comment");
    Ok(comment)
}
