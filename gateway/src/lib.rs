//! Edge dispatcher.
//!
//! Authenticates each request once, then forwards it by path prefix
//! (`/api/v1/<domain>/...`) to the backend that owns the domain. Request and
//! audit events are published in the background.

pub mod auth;
pub mod proxy;
pub mod routing;

use std::sync::Arc;
use std::time::Duration;

use axum::{
    Json, Router,
    http::StatusCode,
    middleware::from_fn_with_state,
    response::{IntoResponse, Response},
    routing::{any, get},
};
use common::response::{ApiResponse, ErrorCode};
use tower_http::cors::CorsLayer;
use util::bus::EventPublisher;
use util::config::AppConfig;
use util::jwt::TokenIssuer;

use crate::routing::RoutingTable;

/// Shared handles for the middleware and the forwarder.
#[derive(Clone)]
pub struct GatewayState {
    pub table: Arc<RoutingTable>,
    pub client: reqwest::Client,
    pub issuer: TokenIssuer,
    pub events: EventPublisher,
}

impl GatewayState {
    pub fn new(table: RoutingTable, issuer: TokenIssuer, events: EventPublisher, timeout: Duration) -> anyhow::Result<Self> {
        // Redirects are the client's business; the gateway relays them as-is.
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .redirect(reqwest::redirect::Policy::none())
            .build()?;
        Ok(Self {
            table: Arc::new(table),
            client,
            issuer,
            events,
        })
    }

    pub fn from_config(events: EventPublisher) -> anyhow::Result<Self> {
        let timeout = Duration::from_secs(AppConfig::global().upstream_timeout_secs);
        Self::new(RoutingTable::from_config(), TokenIssuer::from_config(), events, timeout)
    }
}

/// GET /health
async fn health() -> Json<ApiResponse<&'static str>> {
    Json(ApiResponse::success("OK").with_message("Gateway healthy"))
}

/// Error envelope produced by the gateway itself.
pub(crate) fn reject(code: ErrorCode, message: impl Into<String>) -> Response {
    let status = StatusCode::from_u16(code.status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, Json(ApiResponse::error(code, message))).into_response()
}

pub fn app(state: GatewayState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route(
            "/api/v1/{*rest}",
            any(proxy::forward).route_layer(from_fn_with_state(state.clone(), auth::authenticate)),
        )
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}
