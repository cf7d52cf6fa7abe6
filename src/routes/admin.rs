use crate::{AppState, handlers};
use axum::{Router, routing::get};

/// Admin Router Module
///
/// Nested under the registry section slug. The wildcard hands the remaining path to
/// `AdminRoute::parse`; the resource permission check happens per page, after the
/// resource key has been resolved.
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        // GET /admin
        // Dashboard: navigation over every resource the viewer may read.
        .route("/", get(handlers::admin_dashboard))
        // GET /admin/{key}, /admin/{key}/new, /admin/{key}/{id}, /admin/{key}/{id}/edit
        .route("/{*path}", get(handlers::admin_page))
}
