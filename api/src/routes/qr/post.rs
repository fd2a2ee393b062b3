use axum::extract::{Path, State};
use chrono::Utc;
use services::attendance_service::GeneratedSession;
use util::state::AppState;
use uuid::Uuid;

use crate::auth::CurrentSubject;
use crate::response::{ApiResult, ApiSuccess};
use crate::routes::common::attendance_service;

/// POST /qr/class/{schedule_id}/regenerate
///
/// Closes whatever session the schedule has open and issues a fresh class
/// session with the default duration.
///
/// ### Responses
/// - `201 Created` with the new session
/// - `404 NOT_FOUND` when the schedule does not exist
pub async fn regenerate_class_qr(
    State(state): State<AppState>,
    CurrentSubject(me): CurrentSubject,
    Path(schedule_id): Path<Uuid>,
) -> ApiResult<GeneratedSession> {
    let session = attendance_service(&state)
        .regenerate_session(&me, schedule_id, Utc::now())
        .await?;
    Ok(ApiSuccess::created(session, "QR session regenerated"))
}
