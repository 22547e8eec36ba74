pub mod academic;
pub mod storage;
pub mod submission_status;

pub use academic::{AssignmentType, GroupQualifier, GroupTag, ParseEnumError, SubjectType};
pub use submission_status::SubmissionStatus;
