// src/session.rs

use std::convert::Infallible;
use std::time::{SystemTime, UNIX_EPOCH};

use axum::{
    body::Body,
    extract::{FromRef, FromRequestParts},
    http::{Request, header, request::Parts},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

use crate::{config::Config, error::AppError, models::user::Authenticatable};

/// Name of the cookie carrying the signed session token.
pub const SESSION_COOKIE: &str = "blog_session";

/// Session token claims.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Claims {
    /// Subject - the user id (as string).
    pub sub: String,
    /// Display name at login time.
    pub name: String,
    /// Expiration time as Unix timestamp.
    pub exp: usize,
}

/// The logged-in identity a session is bound to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub id: i64,
    pub name: String,
}

/// Per-request session context. Passed explicitly into every service call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Session {
    #[default]
    Anonymous,
    Authenticated(Identity),
}

impl Session {
    pub fn for_user(user: &impl Authenticatable) -> Self {
        Session::Authenticated(Identity {
            id: user.identity_id(),
            name: user.display_name().to_owned(),
        })
    }

    pub fn identity(&self) -> Option<&Identity> {
        match self {
            Session::Anonymous => None,
            Session::Authenticated(identity) => Some(identity),
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.identity().is_some()
    }

    /// Display name, or an empty string when anonymous.
    pub fn user_name(&self) -> &str {
        self.identity().map(|i| i.name.as_str()).unwrap_or("")
    }

    /// The acting identity, or `Unauthorized` carrying `message`.
    pub fn require(&self, message: &str) -> Result<&Identity, AppError> {
        self.identity()
            .ok_or_else(|| AppError::Unauthorized(message.to_string()))
    }
}

/// Signs a session token for the user.
pub fn sign_session(
    user: &impl Authenticatable,
    secret: &str,
    ttl_seconds: u64,
) -> Result<String, AppError> {
    let expiration = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|e| AppError::InternalServerError(e.to_string()))?
        .as_secs() as usize
        + ttl_seconds as usize;

    let claims = Claims {
        sub: user.identity_id().to_string(),
        name: user.display_name().to_owned(),
        exp: expiration,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AppError::InternalServerError(e.to_string()))
}

/// Verifies a token and resolves the session it describes.
pub fn verify_session(token: &str, secret: &str) -> Result<Session, AppError> {
    let invalid = || AppError::Unauthorized("Invalid session".to_string());

    let claims = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|_| invalid())?
    .claims;

    let id = claims.sub.parse::<i64>().map_err(|_| invalid())?;

    Ok(Session::Authenticated(Identity {
        id,
        name: claims.name,
    }))
}

/// Adds the session cookie for `token` to the jar.
pub fn set_session_cookie(jar: CookieJar, token: String, config: &Config) -> CookieJar {
    let cookie = Cookie::build((SESSION_COOKIE, token))
        .path("/")
        .max_age(time::Duration::seconds(config.session_ttl_secs as i64))
        .http_only(true)
        .secure(config.secure_cookies)
        .same_site(SameSite::Lax)
        .build();
    jar.add(cookie)
}

/// Removes the session cookie. A jar without one is returned unchanged
/// apart from the removal header.
pub fn clear_session_cookie(jar: CookieJar) -> CookieJar {
    jar.remove(Cookie::build(SESSION_COOKIE).path("/").build())
}

/// Token from the session cookie, falling back to `Authorization: Bearer`.
fn session_token(parts: &Parts) -> Option<String> {
    let jar = CookieJar::from_headers(&parts.headers);
    if let Some(cookie) = jar.get(SESSION_COOKIE) {
        return Some(cookie.value().to_owned());
    }

    parts
        .headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::to_owned)
}

/// Never rejects: missing, expired or tampered tokens are anonymous.
impl<S> FromRequestParts<S> for Session
where
    Config: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        if let Some(session) = parts.extensions.get::<Session>() {
            return Ok(session.clone());
        }

        let config = Config::from_ref(state);
        let session = match session_token(parts) {
            Some(token) => match verify_session(&token, &config.session_secret) {
                Ok(session) => session,
                Err(_) => {
                    tracing::debug!("Discarding invalid session token");
                    Session::Anonymous
                }
            },
            None => Session::Anonymous,
        };

        parts.extensions.insert(session.clone());
        Ok(session)
    }
}

/// Axum Middleware: Login Required.
///
/// Rejects anonymous requests with 401 before the handler runs.
/// Handlers behind it still receive the `Session` and services re-check it.
pub async fn require_login(
    session: Session,
    req: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    session.require("You need to log in to access this page")?;
    Ok(next.run(req).await)
}
