// src/error.rs

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use std::fmt;

/// Global Application Error Enum.
/// Every service failure maps to exactly one variant, and every variant
/// maps to one HTTP status and one error category.
#[derive(Debug, PartialEq, Eq)]
pub enum AppError {
    // 409 Conflict: registration attempted with a known email
    EmailAlreadyRegistered,

    // 409 Conflict
    UsernameTaken,

    // 400 Bad Request: password and confirmation differ
    PasswordMismatch,

    // 409 Conflict
    DuplicateTitle,

    // 400 Bad Request: size caps, malformed email or url
    BadRequest(String),

    // 401 Unauthorized: no user with that email
    UnknownEmail,

    // 401 Unauthorized: wrong password
    InvalidCredentials,

    // 401 Unauthorized: action requires login
    Unauthorized(String),

    // 403 Forbidden: logged in, but not the author
    Forbidden(String),

    // 404 Not Found
    NotFound(String),

    // 502 Bad Gateway: mail relay unreachable or rejected us
    TransportFailure(String),

    // 500 Internal Server Error
    InternalServerError(String),
}

impl AppError {
    /// Error category reported to clients as `kind`.
    pub fn kind(&self) -> &'static str {
        match self {
            AppError::EmailAlreadyRegistered
            | AppError::UsernameTaken
            | AppError::PasswordMismatch
            | AppError::DuplicateTitle => "validation_conflict",
            AppError::BadRequest(_) => "validation",
            AppError::UnknownEmail | AppError::InvalidCredentials => "credential_mismatch",
            AppError::Unauthorized(_) | AppError::Forbidden(_) => "unauthorized",
            AppError::NotFound(_) => "not_found",
            AppError::TransportFailure(_) => "transport_failure",
            AppError::InternalServerError(_) => "internal",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::EmailAlreadyRegistered
            | AppError::UsernameTaken
            | AppError::DuplicateTitle => StatusCode::CONFLICT,
            AppError::PasswordMismatch | AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::UnknownEmail
            | AppError::InvalidCredentials
            | AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::TransportFailure(_) => StatusCode::BAD_GATEWAY,
            AppError::InternalServerError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::EmailAlreadyRegistered => {
                write!(f, "You've already signed up with that email, log in instead!")
            }
            AppError::UsernameTaken => write!(f, "This username is taken already"),
            AppError::PasswordMismatch => write!(f, "Passwords are not the same"),
            AppError::DuplicateTitle => write!(f, "A post with this title already exists"),
            AppError::UnknownEmail => write!(f, "We don't have this email in our database"),
            AppError::InvalidCredentials => {
                write!(f, "The given password doesn't match this email account")
            }
            AppError::BadRequest(msg)
            | AppError::Unauthorized(msg)
            | AppError::Forbidden(msg)
            | AppError::NotFound(msg)
            | AppError::TransportFailure(msg)
            | AppError::InternalServerError(msg) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for AppError {}

/// Implements `IntoResponse` for `AppError`.
/// Converts the error into a JSON response with appropriate HTTP status code.
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let kind = self.kind();

        let body = match &self {
            AppError::InternalServerError(msg) => {
                tracing::error!("Internal Server Error: {}", msg);
                json!({ "error": "Internal Server Error", "kind": kind })
            }
            AppError::TransportFailure(msg) => {
                tracing::error!("Mail transport failure: {}", msg);
                json!({ "error": "Your message could not be delivered", "kind": kind })
            }
            AppError::EmailAlreadyRegistered => json!({
                "error": self.to_string(),
                "kind": kind,
                "redirect": "/login",
            }),
            _ => json!({ "error": self.to_string(), "kind": kind }),
        };

        (status, Json(body)).into_response()
    }
}

/// Converts `sqlx::Error` into `AppError::InternalServerError`.
/// Allows using `?` operator on database queries.
impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        AppError::InternalServerError(err.to_string())
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        AppError::BadRequest(err.to_string())
    }
}

/// True when a store error is a UNIQUE constraint violation.
pub fn is_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => db_err.is_unique_violation(),
        _ => false,
    }
}
