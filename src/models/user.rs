// src/models/user.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// Something a session can be bound to.
pub trait Authenticatable {
    /// Stable numeric identity stored in the session token.
    fn identity_id(&self) -> i64;

    /// Name shown in page headers.
    fn display_name(&self) -> &str;
}

/// Represents the 'users' table in the database.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct User {
    pub id: i64,

    /// Unique login email.
    pub email: String,

    /// Argon2 PHC string (salt embedded).
    /// Skipped during serialization to prevent leaking sensitive data.
    #[serde(skip)]
    pub password: String,

    /// Display name, unique at registration time.
    pub name: String,
}

impl Authenticatable for User {
    fn identity_id(&self) -> i64 {
        self.id
    }

    fn display_name(&self) -> &str {
        &self.name
    }
}

/// Registration form.
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(
        email(message = "Please enter a valid email address."),
        length(max = 100, message = "Email must be at most 100 characters.")
    )]
    pub email: String,

    #[validate(length(
        min = 1,
        max = 100,
        message = "Name length must be between 1 and 100 characters."
    ))]
    pub name: String,

    #[validate(length(
        min = 1,
        max = 128,
        message = "Password length must be between 1 and 128 characters."
    ))]
    pub password: String,

    /// Must equal `password`; checked by the auth service so the mismatch
    /// surfaces as its own error.
    pub password_confirmation: String,
}

impl RegisterRequest {
    /// Copy with email and name trimmed. Passwords are kept verbatim.
    pub fn trimmed(&self) -> Self {
        Self {
            email: self.email.trim().to_string(),
            name: self.name.trim().to_string(),
            password: self.password.clone(),
            password_confirmation: self.password_confirmation.clone(),
        }
    }
}

/// Login form.
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(length(min = 1, max = 100))]
    pub email: String,
    #[validate(length(min = 1, max = 128))]
    pub password: String,
}
