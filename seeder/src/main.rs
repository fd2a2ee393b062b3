use crate::seed::{Seeder, run_seeder};
use crate::seeds::{
    course::CourseSeeder, enrollment::EnrollmentSeeder, schedule::ScheduleSeeder, subject::SubjectSeeder,
};
use migration::{Migrator, MigratorTrait};
use std::process::ExitCode;

mod seed;
mod seeds;

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    let db = match db::connect().await {
        Ok(db) => db,
        Err(e) => {
            eprintln!("database connection failed: {e}");
            return ExitCode::FAILURE;
        }
    };
    if let Err(e) = Migrator::up(&db, None).await {
        eprintln!("migration failed: {e}");
        return ExitCode::FAILURE;
    }

    let seeders: [(&dyn Seeder, &str); 4] = [
        (&SubjectSeeder, "Subject"),
        (&CourseSeeder, "Course"),
        (&ScheduleSeeder, "Schedule"),
        (&EnrollmentSeeder, "Enrollment"),
    ];
    for (seeder, name) in seeders {
        if let Err(e) = run_seeder(seeder, name, &db).await {
            eprintln!("{name} seeder failed: {e}");
            return ExitCode::FAILURE;
        }
    }
    ExitCode::SUCCESS
}
