// src/services/mail.rs

use async_trait::async_trait;
use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::{Mailbox, header::ContentType},
    transport::smtp::authentication::Credentials,
};
use serde::Deserialize;
use validator::Validate;

use crate::{config::MailConfig, error::AppError};

/// Contact-form submission.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ContactMessage {
    #[validate(length(min = 1, max = 100, message = "Name must be between 1 and 100 chars"))]
    pub name: String,
    #[validate(email(message = "Please enter a valid email address."))]
    pub email: String,
    #[validate(length(
        min = 1,
        max = 5000,
        message = "Message must be between 1 and 5000 chars"
    ))]
    pub message: String,
}

impl ContactMessage {
    pub fn subject(&self) -> String {
        format!("Message from blog website: {}", self.name)
    }

    pub fn body(&self) -> String {
        format!("from: {}, {}\n{}", self.name, self.email, self.message)
    }
}

/// Delivers contact messages to the site operator.
#[async_trait]
pub trait Mailer: Send + Sync {
    /// One attempt, no retry. `TransportFailure` on any relay error.
    async fn send(&self, message: &ContactMessage) -> Result<(), AppError>;
}

/// Mailer backed by an authenticated STARTTLS SMTP relay.
/// A fresh connection is opened for every message and closed afterwards.
pub struct SmtpMailer {
    config: Option<MailConfig>,
}

impl SmtpMailer {
    pub fn new(config: Option<MailConfig>) -> Self {
        if config.is_none() {
            tracing::warn!("Mail relay not configured - contact messages will be rejected");
        }
        Self { config }
    }

    fn build(config: &MailConfig, message: &ContactMessage) -> Result<Message, AppError> {
        let parse = |addr: &str| {
            addr.parse::<Mailbox>()
                .map_err(|e| AppError::InternalServerError(format!("bad mail address: {}", e)))
        };

        let mut builder = Message::builder()
            .from(parse(&config.sender)?)
            .to(parse(&config.recipient)?)
            .subject(message.subject())
            .header(ContentType::TEXT_PLAIN);

        // The submitter's address is only a convenience for replying.
        if let Ok(reply_to) = message.email.parse::<Mailbox>() {
            builder = builder.reply_to(reply_to);
        }

        builder
            .body(message.body())
            .map_err(|e| AppError::InternalServerError(e.to_string()))
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, message: &ContactMessage) -> Result<(), AppError> {
        let config = self.config.as_ref().ok_or_else(|| {
            AppError::TransportFailure("mail relay is not configured".to_string())
        })?;

        let email = Self::build(config, message)?;

        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)
            .map_err(|e| AppError::TransportFailure(e.to_string()))?
            .port(config.smtp_port)
            .timeout(Some(config.timeout))
            .credentials(Credentials::new(
                config.sender.clone(),
                config.password.clone(),
            ))
            .build();

        transport
            .send(email)
            .await
            .map_err(|e| AppError::TransportFailure(e.to_string()))?;

        tracing::info!(relay = %config.smtp_host, "Delivered contact message");
        Ok(())
    }
}

/// Validates a submission and hands it to the mailer.
pub async fn send_contact_message(
    mailer: &dyn Mailer,
    message: &ContactMessage,
) -> Result<(), AppError> {
    message.validate()?;
    mailer.send(message).await
}
