use axum::extract::State;
use services::subject_service::{SubjectProfile, SubjectService};
use util::state::AppState;

use crate::auth::CurrentSubject;
use crate::response::{ApiResult, ApiSuccess};

/// GET /auth/me
///
/// The caller with the detail record of its role.
pub async fn get_me(State(state): State<AppState>, CurrentSubject(me): CurrentSubject) -> ApiResult<SubjectProfile> {
    let profile = SubjectService::new(state.db_clone()).find_with_detail(me.id).await?;
    Ok(ApiSuccess::ok(profile, "User data retrieved successfully"))
}
