//! `/attendance` routes.
//!
//! - `POST /attendance/qr/generate` (lecturer/staff)
//! - `POST /attendance/qr/scan`
//! - `POST /attendance/qr/sessions/{session_id}/deactivate` (lecturer/staff)
//! - `GET  /attendance`
//! - `GET  /attendance/statistics`
//! - `POST /attendance/manual` (lecturer/staff)
//! - `PUT  /attendance/{attendance_id}` (lecturer/staff)
//! - `POST /attendance/tap-in`, `POST /attendance/tap-out`

pub mod get;
pub mod post;
pub mod put;

use axum::{
    Router,
    middleware::from_fn,
    routing::{get, post, put},
};
use util::state::AppState;

use crate::auth::guards::{allow_authenticated, allow_presenter};

pub fn attendance_routes() -> Router<AppState> {
    let presenter = Router::new()
        .route("/qr/generate", post(post::generate_qr))
        .route("/qr/sessions/{session_id}/deactivate", post(post::deactivate_session))
        .route("/manual", post(post::create_manual))
        .route("/{attendance_id}", put(put::update_attendance))
        .route_layer(from_fn(allow_presenter));

    let anyone = Router::new()
        .route("/", get(get::list_attendance))
        .route("/statistics", get(get::statistics))
        .route("/qr/scan", post(post::scan_qr))
        .route("/tap-in", post(post::tap_in))
        .route("/tap-out", post(post::tap_out))
        .route_layer(from_fn(allow_authenticated));

    presenter.merge(anyone)
}
