use axum::extract::{Path, State};
use chrono::Utc;
use db::models::attendance_record::AttendanceStatus;
use serde::Deserialize;
use services::attendance_service::AttendanceRecord;
use util::state::AppState;
use uuid::Uuid;
use validator::Validate;

use crate::auth::CurrentSubject;
use crate::response::{ApiResult, ApiSuccess, ValidatedJson};
use crate::routes::common::attendance_service;

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateAttendanceRequest {
    pub status: AttendanceStatus,
    #[validate(length(max = 500, message = "notes must be at most 500 characters"))]
    pub notes: Option<String>,
}

/// PUT /attendance/{attendance_id}
///
/// Corrects the status. Records already marked excused or sick are final
/// (`400 BAD_REQUEST`); the date never changes.
pub async fn update_attendance(
    State(state): State<AppState>,
    CurrentSubject(me): CurrentSubject,
    Path(attendance_id): Path<Uuid>,
    ValidatedJson(req): ValidatedJson<UpdateAttendanceRequest>,
) -> ApiResult<AttendanceRecord> {
    let record = attendance_service(&state)
        .update_attendance(&me, attendance_id, req.status, req.notes, Utc::now())
        .await?;
    Ok(ApiSuccess::ok(record, "Attendance updated"))
}
