use sea_orm_migration::prelude::*;

use crate::migrations;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(migrations::m202606010001_create_subjects::Migration),
            Box::new(migrations::m202606010002_create_subject_details::Migration),
            Box::new(migrations::m202606010003_create_courses::Migration),
            Box::new(migrations::m202606010004_create_schedules::Migration),
            Box::new(migrations::m202606010005_create_enrollments::Migration),
            Box::new(migrations::m202606010006_create_attendance_sessions::Migration),
            Box::new(migrations::m202606010007_create_attendance_records::Migration),
            Box::new(migrations::m202606010008_create_gate_access_tokens::Migration),
            Box::new(migrations::m202606010009_create_audit_logs::Migration),
        ]
    }
}
