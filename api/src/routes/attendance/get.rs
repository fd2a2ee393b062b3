use axum::extract::{Query, State, rejection::QueryRejection};
use services::AppError;
use services::attendance_service::{AttendanceFilter, AttendanceRecord, AttendanceStatistics, StatisticsQuery};
use util::state::AppState;

use crate::auth::CurrentSubject;
use crate::response::{ApiError, ApiResult, ApiSuccess, Meta};
use crate::routes::common::attendance_service;

fn bad_query(rejection: QueryRejection) -> ApiError {
    ApiError(AppError::ValidationFailed(rejection.body_text()))
}

/// GET /attendance
///
/// Query: `subject_id, schedule_id, kind, status, date_from, date_to, page, per_page`.
/// Students always get their own records whatever `subject_id` says.
pub async fn list_attendance(
    State(state): State<AppState>,
    CurrentSubject(me): CurrentSubject,
    query: Result<Query<AttendanceFilter>, QueryRejection>,
) -> ApiResult<Vec<AttendanceRecord>> {
    let Query(filter) = query.map_err(bad_query)?;
    let page = attendance_service(&state).list(&me, filter).await?;
    Ok(ApiSuccess::ok(page.records, "Attendance retrieved").with_meta(Meta {
        page: page.page,
        per_page: page.per_page,
        total: page.total,
    }))
}

/// GET /attendance/statistics
pub async fn statistics(
    State(state): State<AppState>,
    CurrentSubject(me): CurrentSubject,
    query: Result<Query<StatisticsQuery>, QueryRejection>,
) -> ApiResult<AttendanceStatistics> {
    let Query(query) = query.map_err(bad_query)?;
    let stats = attendance_service(&state).statistics(&me, query).await?;
    Ok(ApiSuccess::ok(stats, "Statistics retrieved"))
}
