// src/routes.rs

use axum::{Router, middleware, routing::get};
use tower_http::trace::TraceLayer;

use crate::{
    handlers::{auth, contact, pages, posts},
    session::require_login,
    state::AppState,
};

/// Assembles the main application router.
///
/// * Form routes for writing posts sit behind `require_login`.
/// * Everything else is public; services enforce their own session rules.
/// * Applies request tracing and injects the shared state.
pub fn create_router(state: AppState) -> Router {
    let login_required = Router::new()
        .route(
            "/new-post",
            get(posts::new_post_page).post(posts::create_post),
        )
        .route(
            "/edit-post/{id}",
            get(posts::edit_post_page).post(posts::edit_post),
        )
        .route_layer(middleware::from_fn_with_state(state.clone(), require_login));

    Router::new()
        .route("/", get(posts::list_posts))
        .route("/register", get(auth::register_page).post(auth::register))
        .route("/login", get(auth::login_page).post(auth::login))
        .route("/logout", get(auth::logout))
        .route("/post/{id}", get(posts::show_post).post(posts::add_comment))
        .route("/about", get(pages::about))
        .route(
            "/contact",
            get(pages::contact).post(contact::submit_contact),
        )
        .route("/delete/{id}", get(posts::delete_post))
        .merge(login_required)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
