// src/handlers/pages.rs

use axum::{Json, response::IntoResponse};
use serde::Serialize;

use crate::session::Session;

/// Header fields every page view carries.
#[derive(Debug, Serialize)]
pub struct PageContext {
    pub logged_in: bool,
    pub user_name: String,
    pub user_id: Option<i64>,
}

impl From<&Session> for PageContext {
    fn from(session: &Session) -> Self {
        Self {
            logged_in: session.is_authenticated(),
            user_name: session.user_name().to_owned(),
            user_id: session.identity().map(|i| i.id),
        }
    }
}

/// Wraps page-specific fields with the page context.
#[derive(Debug, Serialize)]
pub struct Page<T: Serialize> {
    #[serde(flatten)]
    pub context: PageContext,
    #[serde(flatten)]
    pub content: T,
}

impl<T: Serialize> Page<T> {
    pub fn new(session: &Session, content: T) -> Json<Self> {
        Json(Self {
            context: PageContext::from(session),
            content,
        })
    }
}

#[derive(Debug, Serialize)]
pub struct Static {
    pub page: &'static str,
}

pub async fn about(session: Session) -> impl IntoResponse {
    Page::new(&session, Static { page: "about" })
}

pub async fn contact(session: Session) -> impl IntoResponse {
    Page::new(&session, Static { page: "contact" })
}
