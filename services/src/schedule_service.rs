use chrono::{NaiveDate, NaiveTime};
use db::models::{course, enrollment, schedule, subject};
use sea_orm::DatabaseConnection;
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use crate::error::AppError;
use crate::subject_service::{Role, Subject};

pub use db::models::enrollment::Model as Enrollment;
pub use db::models::schedule::Model as Schedule;

#[derive(Debug, Clone, Deserialize)]
pub struct CreateSchedule {
    pub course_id: Uuid,
    pub lecturer_id: Uuid,
    pub date: NaiveDate,
    pub day_of_week: i16,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub room: String,
}

impl CreateSchedule {
    pub fn validate(&self) -> Result<(), AppError> {
        if !(0..=6).contains(&self.day_of_week) {
            return Err(AppError::ValidationFailed(
                "day_of_week must be between 0 and 6".into(),
            ));
        }
        if self.start_time >= self.end_time {
            return Err(AppError::ValidationFailed(
                "start_time must be before end_time".into(),
            ));
        }
        if self.room.trim().is_empty() {
            return Err(AppError::ValidationFailed("room is required".into()));
        }
        Ok(())
    }
}

pub fn validate_score(score: f64) -> Result<(), AppError> {
    if score.is_finite() && (0.0..=100.0).contains(&score) {
        Ok(())
    } else {
        Err(AppError::ValidationFailed(
            "score must be between 0 and 100".into(),
        ))
    }
}

#[derive(Clone)]
pub struct ScheduleService {
    db: DatabaseConnection,
}

impl ScheduleService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn find(&self, id: Uuid) -> Result<Schedule, AppError> {
        schedule::Model::find_by_id(&self.db, id)
            .await?
            .ok_or_else(|| AppError::not_found("schedule"))
    }

    /// Staff-only. Input is validated before any lookup.
    pub async fn create_schedule(&self, actor: &Subject, req: CreateSchedule) -> Result<Schedule, AppError> {
        if actor.role != Role::Staff {
            return Err(AppError::Forbidden("only staff may create schedules".into()));
        }
        req.validate()?;

        course::Model::find_by_id(&self.db, req.course_id)
            .await?
            .ok_or_else(|| AppError::not_found("course"))?;
        let lecturer = subject::Model::find_by_id(&self.db, req.lecturer_id)
            .await?
            .ok_or_else(|| AppError::not_found("lecturer"))?;
        if lecturer.role != Role::Lecturer {
            return Err(AppError::BadRequest("assigned subject is not a lecturer".into()));
        }

        let created = schedule::Model::create(
            &self.db,
            schedule::NewSchedule {
                course_id: req.course_id,
                lecturer_id: req.lecturer_id,
                date: req.date,
                day_of_week: req.day_of_week,
                start_time: req.start_time,
                end_time: req.end_time,
                room: req.room.trim().to_owned(),
            },
        )
        .await?;
        info!(schedule = %created.id, course = %created.course_id, "schedule created");
        Ok(created)
    }

    /// Records a score in `[0, 100]` and its letter grade.
    pub async fn grade_enrollment(
        &self,
        actor: &Subject,
        enrollment_id: Uuid,
        score: f64,
    ) -> Result<Enrollment, AppError> {
        if !actor.role.is_presenter() {
            return Err(AppError::Forbidden("only lecturers and staff may grade".into()));
        }
        validate_score(score)?;

        let current = enrollment::Model::find_by_id(&self.db, enrollment_id)
            .await?
            .ok_or_else(|| AppError::not_found("enrollment"))?;
        let graded = current.set_score(&self.db, score).await?;
        info!(enrollment = %graded.id, score, "enrollment graded");
        Ok(graded)
    }
}
