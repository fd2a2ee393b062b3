//! Edge authentication.
//!
//! Every forwarded request except the public ones must carry a valid access
//! ticket. The verified identity travels to the backend as `X-User-*` headers;
//! the original `Authorization` header is kept so backends can re-verify.

use axum::{
    body::Body,
    extract::State,
    http::{HeaderMap, HeaderName, HeaderValue, Request},
    middleware::Next,
    response::Response,
};
use common::response::ErrorCode;
use headers::{Authorization, HeaderMapExt, authorization::Bearer};
use tracing::debug;
use util::jwt::{Claims, TokenKind};
use uuid::Uuid;

use crate::{GatewayState, reject};

pub const X_USER_ID: HeaderName = HeaderName::from_static("x-user-id");
pub const X_USER_ROLE: HeaderName = HeaderName::from_static("x-user-role");
pub const X_USER_IDENTITY: HeaderName = HeaderName::from_static("x-user-identity");

/// Paths reachable without a ticket.
pub const PUBLIC_PATHS: &[&str] = &["/health", "/api/v1/auth/login", "/api/v1/auth/refresh"];

/// Caller verified at the edge, stored in the request extensions.
#[derive(Debug, Clone, PartialEq)]
pub struct Identity {
    pub subject_id: Uuid,
    pub role: String,
    pub identity: String,
}

impl From<Claims> for Identity {
    fn from(claims: Claims) -> Self {
        Self {
            subject_id: claims.sub,
            role: claims.role,
            identity: claims.identity,
        }
    }
}

pub fn is_public(path: &str) -> bool {
    PUBLIC_PATHS.contains(&path.trim_end_matches('/'))
}

/// Replaces any client-supplied identity headers with the verified ones.
fn stamp(headers: &mut HeaderMap, identity: Option<&Identity>) {
    headers.remove(X_USER_ID);
    headers.remove(X_USER_ROLE);
    headers.remove(X_USER_IDENTITY);

    let Some(identity) = identity else { return };
    if let Ok(v) = HeaderValue::from_str(&identity.subject_id.to_string()) {
        headers.insert(X_USER_ID, v);
    }
    if let Ok(v) = HeaderValue::from_str(&identity.role) {
        headers.insert(X_USER_ROLE, v);
    }
    if let Ok(v) = HeaderValue::from_str(&identity.identity) {
        headers.insert(X_USER_IDENTITY, v);
    }
}

pub async fn authenticate(State(state): State<GatewayState>, mut req: Request<Body>, next: Next) -> Response {
    if is_public(req.uri().path()) {
        stamp(req.headers_mut(), None);
        return next.run(req).await;
    }

    let Some(Authorization(bearer)) = req.headers().typed_get::<Authorization<Bearer>>() else {
        debug!(path = %req.uri().path(), "missing bearer ticket");
        return reject(ErrorCode::Unauthorized, "missing or invalid authorization header");
    };

    let identity = match state.issuer.validate(bearer.token(), TokenKind::Access) {
        Ok(claims) => Identity::from(claims),
        Err(e) => {
            debug!(path = %req.uri().path(), error = %e, "ticket rejected");
            return reject(ErrorCode::Unauthorized, "invalid or expired token");
        }
    };

    stamp(req.headers_mut(), Some(&identity));
    req.extensions_mut().insert(identity);
    next.run(req).await
}
