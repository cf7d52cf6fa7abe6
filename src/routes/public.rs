use crate::{AppState, handlers};
use axum::{Router, routing::get};

/// Public Router Module
///
/// Endpoints with no capability requirement.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        // GET /health
        // Liveness probe; answers "ok" without touching the session provider.
        .route("/health", get(handlers::health))
        // GET /
        // Redirects to the section dashboard.
        .route("/", get(handlers::root))
        // GET /auth/sign-out
        // Clears the session cookie and redirects to the sign-in form.
        .route("/auth/sign-out", get(handlers::sign_out))
}
