use axum::extract::{Path, State};
use serde::{Deserialize, Serialize};
use services::subject_service::SubjectService;
use util::state::AppState;
use uuid::Uuid;
use validator::Validate;

use crate::response::{ApiResult, ApiSuccess, ValidatedJson};

#[derive(Debug, Deserialize, Validate)]
pub struct SetStatusRequest {
    pub active: bool,
}

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub id: Uuid,
    pub active: bool,
}

/// PUT /users/{user_id}/status
///
/// Activates or deactivates an account. A deactivated subject can no longer
/// log in, use existing tickets, or pass the gate.
///
/// ```json
/// { "active": false }
/// ```
pub async fn set_status(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
    ValidatedJson(req): ValidatedJson<SetStatusRequest>,
) -> ApiResult<StatusResponse> {
    SubjectService::new(state.db_clone())
        .set_active(user_id, req.active)
        .await?;
    Ok(ApiSuccess::ok(
        StatusResponse {
            id: user_id,
            active: req.active,
        },
        "Account status updated",
    ))
}
