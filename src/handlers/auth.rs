// src/handlers/auth.rs

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use axum_extra::extract::cookie::CookieJar;
use serde_json::json;
use sqlx::SqlitePool;

use crate::{
    config::Config,
    error::AppError,
    handlers::pages::{Page, Static},
    models::user::{LoginRequest, RegisterRequest},
    services::auth::{self, SessionSettings},
    session::{Session, clear_session_cookie, set_session_cookie},
};

fn settings(config: &Config) -> SessionSettings<'_> {
    SessionSettings {
        secret: &config.session_secret,
        ttl_secs: config.session_ttl_secs,
    }
}

pub async fn register_page(session: Session) -> impl IntoResponse {
    Page::new(&session, Static { page: "register" })
}

/// Registers a new user and logs them in.
///
/// Returns 201 Created, the user object (excluding password) and the
/// session cookie.
pub async fn register(
    State(pool): State<SqlitePool>,
    State(config): State<Config>,
    jar: CookieJar,
    Json(payload): Json<RegisterRequest>,
) -> Result<impl IntoResponse, AppError> {
    let established = auth::register(&pool, settings(&config), &payload).await?;
    let jar = set_session_cookie(jar, established.token, &config);

    Ok((StatusCode::CREATED, jar, Json(established.user)))
}

pub async fn login_page(session: Session) -> impl IntoResponse {
    Page::new(&session, Static { page: "login" })
}

/// Verifies email and password and sets the session cookie.
pub async fn login(
    State(pool): State<SqlitePool>,
    State(config): State<Config>,
    jar: CookieJar,
    Json(payload): Json<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    let established = auth::login(&pool, settings(&config), &payload).await?;
    let jar = set_session_cookie(jar, established.token, &config);

    Ok((
        jar,
        Json(json!({
            "logged_in": true,
            "user_name": established.user.name,
            "user_id": established.user.id,
        })),
    ))
}

/// Drops the session cookie. Safe to call when not logged in.
pub async fn logout(session: Session, jar: CookieJar) -> impl IntoResponse {
    let session = auth::logout(&session);
    (clear_session_cookie(jar), Page::new(&session, Static { page: "logout" }))
}
