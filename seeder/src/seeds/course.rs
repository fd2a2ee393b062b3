use crate::seed::Seeder;
use async_trait::async_trait;
use db::models::course::Model as CourseModel;
use db::models::subject::{self, Role};
use sea_orm::{ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter};

pub struct CourseSeeder;

const COURSES: &[(&str, &str, i32)] = &[
    ("CS101", "Programming I", 3),
    ("CS102", "Data Structures", 3),
    ("CS201", "Databases", 3),
    ("CS202", "Computer Networks", 2),
    ("MA101", "Discrete Mathematics", 2),
];

#[async_trait]
impl Seeder for CourseSeeder {
    async fn seed(&self, db: &DatabaseConnection) -> Result<(), DbErr> {
        let lecturers = subject::Entity::find()
            .filter(subject::Column::Role.eq(Role::Lecturer))
            .all(db)
            .await?;

        for (i, (code, name, credits)) in COURSES.iter().enumerate() {
            let lecturer_id = match lecturers.len() {
                0 => None,
                n => Some(lecturers[i % n].id),
            };
            CourseModel::create(db, code, name, *credits, lecturer_id).await?;
        }
        Ok(())
    }
}
