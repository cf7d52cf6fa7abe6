use crate::{AppState, handlers};
use axum::{Router, routing::get};

/// API Router Module
///
/// JSON counterparts of the admin pages, nested under `/api`.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        // GET /api/admin/{path}
        // The render plan of the matching admin page, with the same status code.
        .route("/admin/{*path}", get(handlers::get_render_plan))
        // GET /api/resources
        // Navigation for the current session; 401 without one.
        .route("/resources", get(handlers::get_resources))
}
