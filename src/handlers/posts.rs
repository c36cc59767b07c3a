use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Serialize;
use sqlx::SqlitePool;

use crate::{
    error::AppError,
    handlers::pages::{Page, Static},
    models::{
        comment::{Comment, CreateCommentRequest},
        post::{Post, PostDetail, PostForm, PostSummary},
    },
    services::content,
    session::Session,
};

#[derive(Serialize)]
struct PostList {
    all_posts: Vec<PostSummary>,
}

#[derive(Serialize)]
struct PostView {
    post: PostDetail,
}

#[derive(Serialize)]
struct PostFormView {
    post_id: i64,
    form: PostForm,
}

#[derive(Serialize)]
struct CreatedComment {
    comment: Comment,
}

#[derive(Serialize)]
struct SavedPost {
    post: Post,
}

/// Index: every post, oldest first.
pub async fn list_posts(
    State(pool): State<SqlitePool>,
    session: Session,
) -> Result<impl IntoResponse, AppError> {
    let all_posts = content::list_posts(&pool).await?;
    Ok(Page::new(&session, PostList { all_posts }))
}

/// Get a single post by ID, with its comments.
pub async fn show_post(
    State(pool): State<SqlitePool>,
    session: Session,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let post = content::get_post(&pool, id).await?;
    Ok(Page::new(&session, PostView { post }))
}

/// Add a comment to a post.
/// Requires: Login.
pub async fn add_comment(
    State(pool): State<SqlitePool>,
    session: Session,
    Path(id): Path<i64>,
    Json(payload): Json<CreateCommentRequest>,
) -> Result<impl IntoResponse, AppError> {
    let comment = content::add_comment(&pool, &session, id, &payload).await?;
    Ok((StatusCode::CREATED, Page::new(&session, CreatedComment { comment })))
}

pub async fn new_post_page(session: Session) -> impl IntoResponse {
    Page::new(&session, Static { page: "make-post" })
}

/// Create a new post.
/// Requires: Login.
pub async fn create_post(
    State(pool): State<SqlitePool>,
    session: Session,
    Json(payload): Json<PostForm>,
) -> Result<impl IntoResponse, AppError> {
    let post = content::create_post(&pool, &session, &payload).await?;
    Ok((StatusCode::CREATED, Page::new(&session, SavedPost { post })))
}

/// Current values of the post, for prefilling the edit form.
/// Requires: Login + Author.
pub async fn edit_post_page(
    State(pool): State<SqlitePool>,
    session: Session,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let form = content::edit_form(&pool, &session, id).await?;
    Ok(Page::new(&session, PostFormView { post_id: id, form }))
}

/// Requires: Login + Author.
pub async fn edit_post(
    State(pool): State<SqlitePool>,
    session: Session,
    Path(id): Path<i64>,
    Json(payload): Json<PostForm>,
) -> Result<impl IntoResponse, AppError> {
    let post = content::edit_post(&pool, &session, id, &payload).await?;
    Ok(Page::new(&session, SavedPost { post }))
}

/// Delete a post and its comments (hard delete).
/// Requires: Login + Author.
pub async fn delete_post(
    State(pool): State<SqlitePool>,
    session: Session,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    content::delete_post(&pool, &session, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
