pub mod m202606010001_create_subjects;
pub mod m202606010002_create_subject_details;
pub mod m202606010003_create_courses;
pub mod m202606010004_create_schedules;
pub mod m202606010005_create_enrollments;
pub mod m202606010006_create_attendance_sessions;
pub mod m202606010007_create_attendance_records;
pub mod m202606010008_create_gate_access_tokens;
pub mod m202606010009_create_audit_logs;
