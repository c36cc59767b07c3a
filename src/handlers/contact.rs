use std::sync::Arc;

use axum::{Json, extract::State, response::IntoResponse};
use serde_json::json;

use crate::{
    error::AppError,
    services::mail::{ContactMessage, Mailer, send_contact_message},
};

/// Relays a contact-form submission to the operator by email.
/// No login needed. Relay failures come back as 502.
pub async fn submit_contact(
    State(mailer): State<Arc<dyn Mailer>>,
    Json(payload): Json<ContactMessage>,
) -> Result<impl IntoResponse, AppError> {
    send_contact_message(mailer.as_ref(), &payload).await?;
    Ok(Json(json!({ "delivered": true })))
}
