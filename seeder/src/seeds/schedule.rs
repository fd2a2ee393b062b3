use crate::seed::Seeder;
use async_trait::async_trait;
use chrono::{Datelike, Duration, NaiveTime, Utc};
use db::models::course;
use db::models::schedule::{Model as ScheduleModel, NewSchedule};
use sea_orm::{DatabaseConnection, DbErr, EntityTrait};

pub struct ScheduleSeeder;

const SLOTS: &[(u32, u32)] = &[(8, 0), (9, 50), (13, 0), (14, 50)];
const ROOMS: &[&str] = &["A-101", "A-102", "B-204", "C-301"];

/// Two weeks of meetings starting today, one per course per weekday.
#[async_trait]
impl Seeder for ScheduleSeeder {
    async fn seed(&self, db: &DatabaseConnection) -> Result<(), DbErr> {
        let courses = course::Entity::find().all(db).await?;
        let today = Utc::now().date_naive();

        for offset in 0..14 {
            let date = today + Duration::days(offset);
            let weekday = date.weekday().num_days_from_sunday() as i16;
            if weekday == 0 || weekday == 6 {
                continue;
            }
            for (i, course) in courses.iter().enumerate() {
                let Some(lecturer_id) = course.lecturer_id else { continue };
                let (hour, minute) = SLOTS[i % SLOTS.len()];
                let Some(start_time) = NaiveTime::from_hms_opt(hour, minute, 0) else { continue };
                ScheduleModel::create(
                    db,
                    NewSchedule {
                        course_id: course.id,
                        lecturer_id,
                        date,
                        day_of_week: weekday,
                        start_time,
                        end_time: start_time + Duration::minutes(100),
                        room: ROOMS[i % ROOMS.len()].into(),
                    },
                )
                .await?;
            }
        }
        Ok(())
    }
}
