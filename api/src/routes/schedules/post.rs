use axum::extract::State;
use chrono::{NaiveDate, NaiveTime};
use serde::Deserialize;
use services::schedule_service::{CreateSchedule, Schedule, ScheduleService};
use util::state::AppState;
use uuid::Uuid;
use validator::Validate;

use crate::auth::CurrentSubject;
use crate::response::{ApiResult, ApiSuccess, ValidatedJson};

#[derive(Debug, Deserialize, Validate)]
pub struct CreateScheduleRequest {
    pub course_id: Uuid,
    pub lecturer_id: Uuid,
    pub date: NaiveDate,
    #[validate(range(min = 0, max = 6, message = "day_of_week must be between 0 and 6"))]
    pub day_of_week: i16,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    #[validate(length(min = 1, max = 64, message = "room must be between 1 and 64 characters"))]
    pub room: String,
}

/// POST /schedules
///
/// ### Request Body
/// ```json
/// {
///   "course_id": "...", "lecturer_id": "...", "date": "2024-05-01",
///   "day_of_week": 3, "start_time": "09:00:00", "end_time": "10:40:00", "room": "B-204"
/// }
/// ```
///
/// ### Responses
/// - `201 Created` with the schedule
/// - `400 VALIDATION_FAILED` when `start_time >= end_time`
/// - `404 NOT_FOUND` for an unknown course or lecturer
pub async fn create_schedule(
    State(state): State<AppState>,
    CurrentSubject(me): CurrentSubject,
    ValidatedJson(req): ValidatedJson<CreateScheduleRequest>,
) -> ApiResult<Schedule> {
    let schedule = ScheduleService::new(state.db_clone())
        .create_schedule(
            &me,
            CreateSchedule {
                course_id: req.course_id,
                lecturer_id: req.lecturer_id,
                date: req.date,
                day_of_week: req.day_of_week,
                start_time: req.start_time,
                end_time: req.end_time,
                room: req.room,
            },
        )
        .await?;
    Ok(ApiSuccess::created(schedule, "Schedule created"))
}
