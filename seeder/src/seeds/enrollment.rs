use crate::seed::Seeder;
use async_trait::async_trait;
use db::models::enrollment::Model as EnrollmentModel;
use db::models::subject::{self, Role};
use db::models::course;
use sea_orm::{ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter};

pub struct EnrollmentSeeder;

#[async_trait]
impl Seeder for EnrollmentSeeder {
    async fn seed(&self, db: &DatabaseConnection) -> Result<(), DbErr> {
        let students = subject::Entity::find()
            .filter(subject::Column::Role.eq(Role::Student))
            .all(db)
            .await?;
        let courses = course::Entity::find().all(db).await?;

        for student in &students {
            for course in &courses {
                if fastrand::u8(..100) < 60 {
                    EnrollmentModel::create(db, student.id, course.id).await?;
                }
            }
        }
        Ok(())
    }
}
