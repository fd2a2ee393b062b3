pub mod attendance_record;
pub mod attendance_session;
pub mod audit_log;
pub mod course;
pub mod enrollment;
pub mod gate_access_token;
pub mod lecturer_detail;
pub mod schedule;
pub mod staff_detail;
pub mod student_detail;
pub mod subject;

pub use attendance_record::Entity as AttendanceRecord;
pub use attendance_session::Entity as AttendanceSession;
pub use audit_log::Entity as AuditLog;
pub use course::Entity as Course;
pub use enrollment::Entity as Enrollment;
pub use gate_access_token::Entity as GateAccessToken;
pub use schedule::Entity as Schedule;
pub use subject::Entity as Subject;
