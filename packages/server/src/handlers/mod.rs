pub mod admin;
pub mod announcement;
pub mod assignment;
pub mod attendance;
pub mod auth;
pub mod professor;
pub mod report;
pub mod student;
pub mod subject;
