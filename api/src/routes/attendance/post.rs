use axum::{
    body::Bytes,
    extract::{Path, State},
};
use chrono::{NaiveDate, Utc};
use db::models::attendance_record::AttendanceStatus;
use db::models::attendance_session::AttendanceKind;
use serde::Deserialize;
use services::attendance_service::{
    AttendanceRecord, AttendanceSession, Coordinates, GenerateSession, GeneratedSession, ManualAttendance,
    ScanOutcome,
};
use util::state::AppState;
use uuid::Uuid;
use validator::Validate;

use crate::auth::CurrentSubject;
use crate::response::{ApiResult, ApiSuccess, ValidatedJson};
use crate::routes::common::{attendance_service, optional_json};

#[derive(Debug, Deserialize, Validate)]
pub struct GenerateQrRequest {
    pub schedule_id: Option<Uuid>,
    #[serde(rename = "type", alias = "kind")]
    pub kind: AttendanceKind,
    /// Minutes.
    pub duration: Option<i64>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ScanQrRequest {
    #[validate(length(min = 1, message = "qr_data is required"))]
    pub qr_data: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ManualAttendanceRequest {
    pub subject_id: Uuid,
    pub schedule_id: Option<Uuid>,
    #[serde(rename = "type", alias = "kind")]
    pub kind: AttendanceKind,
    pub status: AttendanceStatus,
    pub date: NaiveDate,
    #[validate(length(max = 500, message = "notes must be at most 500 characters"))]
    pub notes: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct TapInRequest {
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

/// POST /attendance/qr/generate
///
/// ### Request Body
/// ```json
/// { "schedule_id": "9a0c...", "type": "kelas", "duration": 15 }
/// ```
///
/// ### Responses
/// - `201 Created` with `{session_id, qr_code, qr_data, expires_at}`
/// - `400 BAD_REQUEST` when `duration <= 0` or a class session has no schedule
/// - `404 NOT_FOUND` when the schedule does not exist
pub async fn generate_qr(
    State(state): State<AppState>,
    CurrentSubject(me): CurrentSubject,
    ValidatedJson(req): ValidatedJson<GenerateQrRequest>,
) -> ApiResult<GeneratedSession> {
    let session = attendance_service(&state)
        .generate_session(
            &me,
            GenerateSession {
                schedule_id: req.schedule_id,
                kind: req.kind,
                duration: req.duration,
            },
            Utc::now(),
        )
        .await?;
    Ok(ApiSuccess::created(session, "QR session generated"))
}

/// POST /attendance/qr/scan
///
/// ### Request Body
/// ```json
/// {
///   "qr_data": "{\"session_id\":\"4f1e...\",\"schedule_id\":\"9c2a...\",\"expires_at\":\"2024-05-01T09:15:00Z\",\"kind\":\"kelas\"}",
///   "latitude": -6.2,
///   "longitude": 106.8
/// }
/// ```
///
/// `qr_data` is the JSON text read from the code, exactly as produced by
/// `/attendance/qr/generate`.
///
/// ### Responses
/// - `201 Created` with `{attendance_id, status, message}`
/// - `400 BAD_REQUEST` "QR code has expired" or "invalid QR data"
/// - `409 CONFLICT` "attendance already recorded for today"
pub async fn scan_qr(
    State(state): State<AppState>,
    CurrentSubject(me): CurrentSubject,
    ValidatedJson(req): ValidatedJson<ScanQrRequest>,
) -> ApiResult<ScanOutcome> {
    let coords = Coordinates::from_parts(req.latitude, req.longitude)?;
    let outcome = attendance_service(&state)
        .scan(&me, &req.qr_data, coords, Utc::now())
        .await?;
    Ok(ApiSuccess::created(outcome, "Attendance recorded"))
}

/// POST /attendance/qr/sessions/{session_id}/deactivate
pub async fn deactivate_session(
    State(state): State<AppState>,
    CurrentSubject(me): CurrentSubject,
    Path(session_id): Path<Uuid>,
) -> ApiResult<AttendanceSession> {
    let session = attendance_service(&state)
        .deactivate_session(&me, session_id, Utc::now())
        .await?;
    Ok(ApiSuccess::ok(session, "Session deactivated"))
}

/// POST /attendance/manual
///
/// Same uniqueness rule as scanning: a second entry for the same subject,
/// date and schedule is a `409 CONFLICT`.
pub async fn create_manual(
    State(state): State<AppState>,
    CurrentSubject(me): CurrentSubject,
    ValidatedJson(req): ValidatedJson<ManualAttendanceRequest>,
) -> ApiResult<AttendanceRecord> {
    let record = attendance_service(&state)
        .create_manual(
            &me,
            ManualAttendance {
                subject_id: req.subject_id,
                schedule_id: req.schedule_id,
                kind: req.kind,
                status: req.status,
                date: req.date,
                notes: req.notes,
            },
            Utc::now(),
        )
        .await?;
    Ok(ApiSuccess::created(record, "Attendance created"))
}

/// POST /attendance/tap-in
///
/// Body is optional: `{ "latitude": -6.2, "longitude": 106.8 }`.
pub async fn tap_in(
    State(state): State<AppState>,
    CurrentSubject(me): CurrentSubject,
    body: Bytes,
) -> ApiResult<AttendanceRecord> {
    let req: TapInRequest = optional_json(&body)?;
    let coords = Coordinates::from_parts(req.latitude, req.longitude)?;
    let record = attendance_service(&state).tap_in(&me, coords, Utc::now()).await?;
    Ok(ApiSuccess::created(record, "Tapped in"))
}

/// POST /attendance/tap-out
pub async fn tap_out(
    State(state): State<AppState>,
    CurrentSubject(me): CurrentSubject,
) -> ApiResult<AttendanceRecord> {
    let record = attendance_service(&state).tap_out(&me, Utc::now()).await?;
    Ok(ApiSuccess::ok(record, "Tapped out"))
}
