pub mod admin;
pub mod announcement;
pub mod assignment;
pub mod assignment_submission;
pub mod attendance_record;
pub mod attendance_session;
pub mod professor;
pub mod student;
pub mod subject;
