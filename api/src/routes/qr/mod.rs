//! `/qr` routes.
//!
//! - `POST /qr/class/{schedule_id}/regenerate` (lecturer/staff)
//! - `GET  /qr/access/generate`
//! - `GET  /qr/access/validate/{session_id}`

pub mod get;
pub mod post;

use axum::{
    Router,
    middleware::from_fn,
    routing::{get, post},
};
use util::state::AppState;

use crate::auth::guards::{allow_authenticated, allow_presenter};

pub fn qr_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/class/{schedule_id}/regenerate",
            post(post::regenerate_class_qr).route_layer(from_fn(allow_presenter)),
        )
        .route(
            "/access/generate",
            get(get::generate_access_qr).route_layer(from_fn(allow_authenticated)),
        )
        .route(
            "/access/validate/{session_id}",
            get(get::validate_access).route_layer(from_fn(allow_authenticated)),
        )
}
