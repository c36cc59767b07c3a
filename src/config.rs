// src/config.rs

use std::env;
use std::time::Duration;

use dotenvy::dotenv;

/// Credentials and addresses for the outbound contact mail relay.
#[derive(Debug, Clone)]
pub struct MailConfig {
    pub smtp_host: String,
    pub smtp_port: u16,
    pub timeout: Duration,
    /// Relay login, also used as the From address.
    pub sender: String,
    pub password: String,
    /// Operator address that receives contact messages.
    pub recipient: String,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub session_secret: String,
    pub session_ttl_secs: u64,
    pub secure_cookies: bool,
    pub bind_addr: String,
    pub rust_log: String,
    /// `None` when the relay credentials are not all present.
    pub mail: Option<MailConfig>,
}

impl Config {
    pub fn from_env() -> Self {
        dotenv().ok();

        let database_url = env::var("DATABASE_URL")
            .unwrap_or_else(|_| "sqlite://blog.db?mode=rwc".to_string());

        let session_secret = env::var("SESSION_SECRET")
            .expect("SESSION_SECRET must be set");

        let session_ttl_secs = env::var("SESSION_TTL_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(604_800);

        let secure_cookies = env::var("SECURE_COOKIES")
            .map(|v| v.eq_ignore_ascii_case("true") || v == "1")
            .unwrap_or(false);

        let bind_addr = env::var("BIND_ADDR")
            .unwrap_or_else(|_| "0.0.0.0:5000".to_string());

        let rust_log = env::var("RUST_LOG")
            .unwrap_or_else(|_| "info".to_string());

        Self {
            database_url,
            session_secret,
            session_ttl_secs,
            secure_cookies,
            bind_addr,
            rust_log,
            mail: MailConfig::from_env(),
        }
    }
}

impl MailConfig {
    /// Reads the relay settings. Returns `None` unless sender, password and
    /// recipient are all set; there are no placeholder fallbacks.
    pub fn from_env() -> Option<Self> {
        let sender = env::var("EMAIL_SENDER").ok()?;
        let password = env::var("PASSWORD_SENDER").ok()?;
        let recipient = env::var("BUSINESS_EMAIL").ok()?;

        let smtp_host = env::var("SMTP_HOST")
            .unwrap_or_else(|_| "smtp.gmail.com".to_string());

        let smtp_port = env::var("SMTP_PORT")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(587);

        let timeout_secs = env::var("SMTP_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(10);

        Some(Self {
            smtp_host,
            smtp_port,
            timeout: Duration::from_secs(timeout_secs),
            sender,
            password,
            recipient,
        })
    }
}
