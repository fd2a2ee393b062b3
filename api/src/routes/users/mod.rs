//! `/users` routes (staff only).

pub mod put;

use axum::{Router, middleware::from_fn, routing::put};
use util::state::AppState;

use crate::auth::guards::allow_staff;

pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/{user_id}/status", put(put::set_status))
        .route_layer(from_fn(allow_staff))
}
