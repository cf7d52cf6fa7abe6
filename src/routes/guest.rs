use crate::{AppState, handlers};
use axum::{Router, routing::get};

/// Guest Router Module
///
/// Forms only meaningful without a session. Both post to the external auth provider
/// and carry the dashboard as their callback.
pub fn guest_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/sign-in", get(handlers::sign_in_page))
        .route("/auth/sign-up", get(handlers::sign_up_page))
}
