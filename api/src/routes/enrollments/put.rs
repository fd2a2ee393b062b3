use axum::extract::{Path, State};
use serde::Deserialize;
use services::schedule_service::{Enrollment, ScheduleService};
use util::state::AppState;
use uuid::Uuid;
use validator::Validate;

use crate::auth::CurrentSubject;
use crate::response::{ApiResult, ApiSuccess, ValidatedJson};

#[derive(Debug, Deserialize, Validate)]
pub struct GradeRequest {
    #[validate(range(min = 0.0, max = 100.0, message = "score must be between 0 and 100"))]
    pub score: f64,
}

/// PUT /enrollments/{enrollment_id}/grade
///
/// ```json
/// { "score": 87.5 }
/// ```
pub async fn grade_enrollment(
    State(state): State<AppState>,
    CurrentSubject(me): CurrentSubject,
    Path(enrollment_id): Path<Uuid>,
    ValidatedJson(req): ValidatedJson<GradeRequest>,
) -> ApiResult<Enrollment> {
    let enrollment = ScheduleService::new(state.db_clone())
        .grade_enrollment(&me, enrollment_id, req.score)
        .await?;
    Ok(ApiSuccess::ok(enrollment, "Enrollment graded"))
}
