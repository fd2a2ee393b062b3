//! Domain services: the attendance and gate-access engines plus the identity,
//! scheduling and audit glue around them.

pub mod attendance_service;
pub mod audit_service;
pub mod auth_service;
pub mod clock;
pub mod error;
pub mod gate_access_service;
pub mod schedule_service;
pub mod subject_service;

pub use error::AppError;
