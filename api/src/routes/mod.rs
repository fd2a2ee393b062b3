//! HTTP route entry point for `/api/v1/...`.
//!
//! Route groups:
//! - `/health` → liveness (public)
//! - `/auth` → login and ticket renewal (public), `/auth/me` (authenticated)
//! - `/attendance` → QR sessions, scanning, manual records, campus tap in/out
//! - `/qr` → class session regeneration and the gate access token
//! - `/schedules` → schedule creation (staff)
//! - `/enrollments` → grading (lecturer/staff)
//! - `/users` → account activation (staff)

use axum::Router;
use util::state::AppState;

use crate::routes::{
    attendance::attendance_routes, auth::auth_routes, enrollments::enrollment_routes, health::health_routes,
    qr::qr_routes, schedules::schedule_routes, users::user_routes,
};

pub mod attendance;
pub mod auth;
pub mod common;
pub mod enrollments;
pub mod health;
pub mod qr;
pub mod schedules;
pub mod users;

/// Builds the router for every endpoint, bound to `app_state`.
///
/// Access control is applied per group through `route_layer`, so unmatched
/// paths fall through to a plain `404` instead of an auth error.
pub fn routes(app_state: AppState) -> Router {
    Router::new()
        .nest("/health", health_routes())
        .nest("/auth", auth_routes())
        .nest("/attendance", attendance_routes())
        .nest("/qr", qr_routes())
        .nest("/schedules", schedule_routes())
        .nest("/enrollments", enrollment_routes())
        .nest("/users", user_routes())
        .with_state(app_state)
}
