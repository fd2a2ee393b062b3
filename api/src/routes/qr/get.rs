use axum::extract::{Path, State};
use chrono::Utc;
use services::gate_access_service::{GateToken, GateValidation};
use util::state::AppState;

use crate::auth::CurrentSubject;
use crate::response::{ApiResult, ApiSuccess};
use crate::routes::common::gate_service;

/// GET /qr/access/generate
///
/// Returns the caller's long-lived gate token, issuing one on first use.
/// Repeated calls return the same `session_id`.
pub async fn generate_access_qr(
    State(state): State<AppState>,
    CurrentSubject(me): CurrentSubject,
) -> ApiResult<GateToken> {
    let token = gate_service(&state).get_or_create_token(&me, Utc::now()).await?;
    Ok(ApiSuccess::ok(token, "Access QR retrieved"))
}

/// GET /qr/access/validate/{session_id}
///
/// Called by gate readers. Unknown, revoked or expired tokens are not an
/// error: the response is `200 OK` with `valid: false`.
///
/// ```json
/// { "valid": true, "tap_outcome": "tap_in", "subject_id": "..." }
/// ```
pub async fn validate_access(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> ApiResult<GateValidation> {
    let validation = gate_service(&state).validate_at_gate(&session_id, Utc::now()).await?;
    Ok(ApiSuccess::ok(validation, "Access validated"))
}
