//! `/schedules` routes.

pub mod post;

use axum::{Router, middleware::from_fn, routing::post};
use util::state::AppState;

use crate::auth::guards::allow_staff;

pub fn schedule_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(post::create_schedule))
        .route_layer(from_fn(allow_staff))
}
