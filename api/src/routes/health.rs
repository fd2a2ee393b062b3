use axum::{Router, routing::get};
use util::state::AppState;

use crate::response::ApiSuccess;

/// Builds the `/health` route group.
pub fn health_routes() -> Router<AppState> {
    Router::new().route("/", get(health_check))
}

/// GET /health
///
/// ```json
/// { "success": true, "data": "OK", "message": "Health check passed" }
/// ```
async fn health_check() -> ApiSuccess<&'static str> {
    ApiSuccess::ok("OK", "Health check passed")
}
