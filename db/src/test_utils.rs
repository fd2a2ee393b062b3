use migration::Migrator;
use sea_orm::{Database, DatabaseConnection};
use sea_orm_migration::MigratorTrait;
use std::path::Path;

pub async fn setup_test_db() -> DatabaseConnection {
    let db = Database::connect("sqlite::memory:")
        .await
        .expect("Failed to connect to in-memory db");

    Migrator::up(&db, None)
        .await
        .expect("Failed to run migrations");

    db
}

/// File-backed database for tests that race several writers.
pub async fn setup_file_test_db(dir: &Path) -> DatabaseConnection {
    let url = format!("sqlite://{}?mode=rwc", dir.join("campus-test.db").display());
    let db = Database::connect(&url)
        .await
        .expect("Failed to open test db file");

    Migrator::up(&db, None)
        .await
        .expect("Failed to run migrations");

    db
}
