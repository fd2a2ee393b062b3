//! `/enrollments` routes.

pub mod put;

use axum::{Router, middleware::from_fn, routing::put};
use util::state::AppState;

use crate::auth::guards::allow_presenter;

pub fn enrollment_routes() -> Router<AppState> {
    Router::new()
        .route("/{enrollment_id}/grade", put(put::grade_enrollment))
        .route_layer(from_fn(allow_presenter))
}
