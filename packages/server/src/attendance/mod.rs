//! Attendance session ledger: one session per (subject, professor, date,
//! group) with one record per cohort student.

pub mod cohort;
pub mod error;
pub mod ledger;

pub use cohort::cohort_group;
pub use error::LedgerError;
pub use ledger::{
    AttendanceLedger, MarkOutcome, MarkRequest, RecordEdit, SessionFilter, SessionKey,
    SessionReportRow, SessionSummary, StudentAttendanceRow,
};
