//! Streaming reverse proxy.
//!
//! Bodies are streamed in both directions; only hop-by-hop headers and `Host`
//! are dropped. Application errors from the backend are relayed untouched and
//! never retried. A backend that cannot be reached within the timeout yields
//! `502 BAD_GATEWAY`.

use std::time::{Duration, Instant};

use axum::{
    body::{Body, HttpBody},
    extract::{Request, State},
    http::{HeaderMap, Method, StatusCode, header},
    response::Response,
};
use common::response::ErrorCode;
use serde_json::json;
use tracing::{info, warn};
use util::bus::{Event, EventPublisher};

use crate::auth::Identity;
use crate::{GatewayState, reject};

const HOP_BY_HOP: &[&str] = &[
    "connection",
    "keep-alive",
    "proxy-authenticate",
    "proxy-authorization",
    "te",
    "trailer",
    "transfer-encoding",
    "upgrade",
];

/// Domains whose reads are audited as well as their writes.
const SENSITIVE_DOMAINS: &[&str] = &["auth", "users"];

/// Copies `headers` minus hop-by-hop headers, `Host`, and anything the
/// `Connection` header names.
pub fn forwardable_headers(headers: &HeaderMap) -> HeaderMap {
    let listed: Vec<String> = headers
        .get_all(header::CONNECTION)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .map(|name| name.trim().to_ascii_lowercase())
        .filter(|name| !name.is_empty())
        .collect();

    let mut out = HeaderMap::with_capacity(headers.len());
    for (name, value) in headers {
        if name == header::HOST
            || HOP_BY_HOP.contains(&name.as_str())
            || listed.iter().any(|l| l == name.as_str())
        {
            continue;
        }
        out.append(name.clone(), value.clone());
    }
    out
}

pub fn is_mutating(method: &Method) -> bool {
    matches!(*method, Method::POST | Method::PUT | Method::PATCH | Method::DELETE)
}

pub fn is_audited(method: &Method, domain: &str) -> bool {
    is_mutating(method) || SENSITIVE_DOMAINS.contains(&domain)
}

fn relay(upstream: reqwest::Response) -> Response {
    let status = upstream.status();
    let headers = forwardable_headers(upstream.headers());

    let mut response = Response::new(Body::from_stream(upstream.bytes_stream()));
    *response.status_mut() = status;
    *response.headers_mut() = headers;
    response
}

struct Dispatch<'a> {
    domain: &'a str,
    method: &'a Method,
    path: &'a str,
    status: StatusCode,
    identity: Option<&'a Identity>,
    latency: Duration,
}

fn publish_events(events: &EventPublisher, d: &Dispatch<'_>) {
    let verb = d.method.as_str().to_ascii_lowercase();
    let subject_id = d.identity.map(|i| i.subject_id);
    let role = d.identity.map(|i| i.role.as_str());

    events.emit(Event::request(
        d.domain,
        &verb,
        json!({
            "method": d.method.as_str(),
            "path": d.path,
            "status": d.status.as_u16(),
            "latency_ms": d.latency.as_millis() as u64,
            "subject_id": subject_id,
            "role": role,
        }),
    ));

    if is_audited(d.method, d.domain) {
        events.emit(Event::audit(
            d.domain,
            &verb,
            json!({
                "subject_id": subject_id,
                "role": role,
                "identity": d.identity.map(|i| i.identity.as_str()),
                "method": d.method.as_str(),
                "path": d.path,
                "status": d.status.as_u16(),
            }),
        ));
    }
}

/// Forwards any `/api/v1/<domain>/...` request to the backend owning `domain`.
pub async fn forward(State(state): State<GatewayState>, req: Request) -> Response {
    let started = Instant::now();
    let (parts, body) = req.into_parts();
    let path = parts.uri.path();

    let Some(route) = state.table.resolve(path) else {
        return reject(ErrorCode::NotFound, format!("no service handles {path}"));
    };
    let url = route.url_for(parts.uri.path_and_query().map_or(path, |pq| pq.as_str()));

    let mut upstream = state
        .client
        .request(parts.method.clone(), &url)
        .headers(forwardable_headers(&parts.headers));
    if body.size_hint().exact() != Some(0) {
        upstream = upstream.body(reqwest::Body::wrap_stream(body.into_data_stream()));
    }
    let sent = upstream.send().await;

    let response = match sent {
        Ok(upstream) => relay(upstream),
        Err(e) => {
            warn!(
                domain = route.domain,
                upstream = route.upstream,
                error = %e,
                timeout = e.is_timeout(),
                "upstream unreachable"
            );
            reject(ErrorCode::BadGateway, "upstream service unavailable")
        }
    };

    let identity = parts.extensions.get::<Identity>();
    let dispatch = Dispatch {
        domain: route.domain,
        method: &parts.method,
        path,
        status: response.status(),
        identity,
        latency: started.elapsed(),
    };
    info!(
        method = %parts.method,
        path,
        domain = route.domain,
        upstream = route.upstream,
        subject = identity.map(|i| i.subject_id.to_string()).as_deref().unwrap_or("anonymous"),
        status = dispatch.status.as_u16(),
        latency_ms = dispatch.latency.as_millis() as u64,
        "dispatch"
    );
    publish_events(&state.events, &dispatch);

    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn strips_hop_by_hop_and_connection_listed_headers() {
        let mut headers = HeaderMap::new();
        headers.insert(header::HOST, HeaderValue::from_static("gateway:8080"));
        headers.insert(header::CONNECTION, HeaderValue::from_static("keep-alive, X-Trace-Hop"));
        headers.insert("keep-alive", HeaderValue::from_static("timeout=5"));
        headers.insert(header::TRANSFER_ENCODING, HeaderValue::from_static("chunked"));
        headers.insert("x-trace-hop", HeaderValue::from_static("1"));
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer abc"));
        headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.append("x-multi", HeaderValue::from_static("a"));
        headers.append("x-multi", HeaderValue::from_static("b"));

        let out = forwardable_headers(&headers);

        assert!(out.get(header::HOST).is_none());
        assert!(out.get(header::CONNECTION).is_none());
        assert!(out.get("keep-alive").is_none());
        assert!(out.get(header::TRANSFER_ENCODING).is_none());
        assert!(out.get("x-trace-hop").is_none());
        assert_eq!(out[header::AUTHORIZATION], "Bearer abc");
        assert_eq!(out[header::CONTENT_TYPE], "application/json");
        assert_eq!(out.get_all("x-multi").iter().count(), 2);
    }

    #[test]
    fn audit_covers_writes_and_sensitive_reads() {
        assert!(is_audited(&Method::POST, "attendance"));
        assert!(is_audited(&Method::DELETE, "files"));
        assert!(is_audited(&Method::GET, "users"));
        assert!(!is_audited(&Method::GET, "attendance"));
        assert!(!is_audited(&Method::OPTIONS, "qr"));
    }
}
