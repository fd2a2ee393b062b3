//! `/auth` routes: login, ticket renewal and the caller's own profile.

pub mod get;
pub mod post;

use axum::{
    Router,
    middleware::from_fn,
    routing::{get, post},
};
use util::state::AppState;

use crate::auth::guards::allow_authenticated;

/// - `POST /auth/login` → `login`
/// - `POST /auth/refresh` → `refresh`
/// - `GET /auth/me` → `get_me`
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/login", post(post::login))
        .route("/refresh", post(post::refresh))
        .route("/me", get(get::get_me).route_layer(from_fn(allow_authenticated)))
}
