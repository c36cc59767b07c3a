// src/services/auth.rs

use sqlx::SqlitePool;
use validator::Validate;

use crate::{
    error::{AppError, is_unique_violation},
    models::user::{LoginRequest, RegisterRequest, User},
    session::{Session, sign_session},
    utils::hash::{hash_password, verify_password},
};

/// A freshly established login: the user, their session context and the
/// signed token the router stores in the session cookie.
#[derive(Debug)]
pub struct Established {
    pub user: User,
    pub session: Session,
    pub token: String,
}

/// Settings the auth service needs to issue sessions.
#[derive(Debug, Clone, Copy)]
pub struct SessionSettings<'a> {
    pub secret: &'a str,
    pub ttl_secs: u64,
}

async fn find_by_email(pool: &SqlitePool, email: &str) -> Result<Option<User>, AppError> {
    let user = sqlx::query_as::<_, User>(
        "SELECT id, email, password, name FROM users WHERE email = ?",
    )
    .bind(email)
    .fetch_optional(pool)
    .await?;
    Ok(user)
}

async fn name_exists(pool: &SqlitePool, name: &str) -> Result<bool, AppError> {
    let row: Option<(i64,)> = sqlx::query_as("SELECT id FROM users WHERE name = ?")
        .bind(name)
        .fetch_optional(pool)
        .await?;
    Ok(row.is_some())
}

pub async fn find_by_id(pool: &SqlitePool, id: i64) -> Result<Option<User>, AppError> {
    let user = sqlx::query_as::<_, User>(
        "SELECT id, email, password, name FROM users WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;
    Ok(user)
}

fn establish(user: User, settings: SessionSettings<'_>) -> Result<Established, AppError> {
    let token = sign_session(&user, settings.secret, settings.ttl_secs)?;
    let session = Session::for_user(&user);
    Ok(Established {
        user,
        session,
        token,
    })
}

/// Registers a new user and logs them in.
///
/// Email and name are trimmed before validation. Checks then run in order:
/// email, name, password confirmation. Any failure leaves the store
/// untouched.
pub async fn register(
    pool: &SqlitePool,
    settings: SessionSettings<'_>,
    form: &RegisterRequest,
) -> Result<Established, AppError> {
    let form = form.trimmed();
    form.validate()?;

    let email = form.email.as_str();
    let name = form.name.as_str();

    if find_by_email(pool, email).await?.is_some() {
        return Err(AppError::EmailAlreadyRegistered);
    }
    if name_exists(pool, name).await? {
        return Err(AppError::UsernameTaken);
    }
    if form.password != form.password_confirmation {
        return Err(AppError::PasswordMismatch);
    }

    let hashed_password = hash_password(&form.password)?;

    let user = sqlx::query_as::<_, User>(
        r#"
        INSERT INTO users (email, password, name)
        VALUES (?, ?, ?)
        RETURNING id, email, password, name
        "#,
    )
    .bind(email)
    .bind(&hashed_password)
    .bind(name)
    .fetch_one(pool)
    .await
    .map_err(|e| {
        // Lost a race against a concurrent registration with the same email.
        if is_unique_violation(&e) {
            AppError::EmailAlreadyRegistered
        } else {
            tracing::error!("Failed to register user: {:?}", e);
            AppError::from(e)
        }
    })?;

    tracing::info!(user_id = user.id, "Registered new user");
    establish(user, settings)
}

/// Verifies credentials and establishes a session.
pub async fn login(
    pool: &SqlitePool,
    settings: SessionSettings<'_>,
    form: &LoginRequest,
) -> Result<Established, AppError> {
    form.validate()?;

    let user = find_by_email(pool, form.email.trim())
        .await?
        .ok_or(AppError::UnknownEmail)?;

    if !verify_password(&form.password, &user.password)? {
        tracing::warn!(user_id = user.id, "Rejected login with wrong password");
        return Err(AppError::InvalidCredentials);
    }

    tracing::info!(user_id = user.id, "User logged in");
    establish(user, settings)
}

/// Ends the session. Logging out while anonymous is a no-op.
pub fn logout(session: &Session) -> Session {
    if let Some(identity) = session.identity() {
        tracing::info!(user_id = identity.id, "User logged out");
    }
    Session::Anonymous
}

/// Resolves the session to its stored user. A token whose user row no
/// longer exists counts as anonymous.
pub async fn current_identity(
    pool: &SqlitePool,
    session: &Session,
) -> Result<Option<User>, AppError> {
    match session.identity() {
        Some(identity) => find_by_id(pool, identity.id).await,
        None => Ok(None),
    }
}

/// The stored user behind an authenticated session.
///
/// Anonymous sessions fail with `Unauthorized` carrying `message`. A signed
/// token whose user row is gone is treated the same way.
pub async fn require_user(
    pool: &SqlitePool,
    session: &Session,
    message: &str,
) -> Result<User, AppError> {
    let identity = session.require(message)?;

    match current_identity(pool, session).await? {
        Some(user) => Ok(user),
        None => {
            tracing::warn!(user_id = identity.id, "Session refers to a missing user");
            Err(AppError::Unauthorized(
                "Your session is no longer valid, please log in again".to_string(),
            ))
        }
    }
}
