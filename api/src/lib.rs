pub mod auth;
pub mod response;
pub mod routes;

use axum::{Router, middleware::from_fn};
use tower_http::cors::CorsLayer;
use util::state::AppState;

use crate::auth::middleware::log_request;
use crate::routes::routes;

/// The full HTTP application: every route group under `/api/v1`, with request
/// logging and permissive CORS.
pub fn app(state: AppState) -> Router {
    Router::new()
        .nest("/api/v1", routes(state))
        .layer(from_fn(log_request))
        .layer(CorsLayer::very_permissive())
}
