//! Read-side aggregation: attendance percentages, assignment completion and
//! per-subject breakdowns for a student.

pub mod service;
pub mod stats;

pub use service::{ReportService, StudentReport};
pub use stats::{SubjectTally, Tally, percentage, tally_by_subject};
