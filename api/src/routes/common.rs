//! Service construction shared by the route handlers.

use axum::body::Bytes;
use serde::de::DeserializeOwned;
use services::AppError;
use services::attendance_service::{AttendanceService, AttendanceSettings};
use services::gate_access_service::{GateAccessService, GateSettings};
use util::state::AppState;

use crate::response::ApiError;

pub fn attendance_service(state: &AppState) -> AttendanceService {
    AttendanceService::new(
        state.db_clone(),
        state.events().clone(),
        AttendanceSettings::from_config(),
    )
}

pub fn gate_service(state: &AppState) -> GateAccessService {
    GateAccessService::new(state.db_clone(), state.events().clone(), GateSettings::from_config())
}

/// Parses an optional JSON body; an empty body yields the default value.
pub fn optional_json<T: DeserializeOwned + Default>(body: &Bytes) -> Result<T, ApiError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(T::default());
    }
    serde_json::from_slice(body).map_err(|e| ApiError(AppError::ValidationFailed(e.to_string())))
}
