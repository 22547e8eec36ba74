use serde::Serialize;

use super::attendance::AttendanceSummary;
use super::student::StudentResponse;
use crate::reporting::{StudentReport, SubjectTally, Tally};

/// Assignments handed in out of all assignments.
#[derive(Serialize, utoipa::ToSchema)]
pub struct AssignmentSummary {
    #[schema(example = 3)]
    pub done: u64,
    #[schema(example = 4)]
    pub total: u64,
    #[schema(example = 75.0)]
    pub percentage: f64,
}

impl From<Tally> for AssignmentSummary {
    fn from(t: Tally) -> Self {
        Self {
            done: t.hits,
            total: t.total,
            percentage: t.percentage(),
        }
    }
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct SubjectAttendanceItem {
    pub subject_id: i32,
    #[schema(example = "Data Structures")]
    pub subject_name: String,
    pub present: u64,
    pub total: u64,
    pub percentage: f64,
}

impl From<SubjectTally> for SubjectAttendanceItem {
    fn from(s: SubjectTally) -> Self {
        Self {
            subject_id: s.subject_id,
            subject_name: s.subject_name,
            present: s.tally.hits,
            total: s.tally.total,
            percentage: s.tally.percentage(),
        }
    }
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct SubjectAssignmentItem {
    pub subject_id: i32,
    #[schema(example = "Data Structures")]
    pub subject_name: String,
    pub done: u64,
    pub total: u64,
}

impl From<SubjectTally> for SubjectAssignmentItem {
    fn from(s: SubjectTally) -> Self {
        Self {
            subject_id: s.subject_id,
            subject_name: s.subject_name,
            done: s.tally.hits,
            total: s.tally.total,
        }
    }
}

/// Headline numbers for a student's dashboard.
#[derive(Serialize, utoipa::ToSchema)]
pub struct DashboardResponse {
    pub student: StudentResponse,
    pub attendance: AttendanceSummary,
    pub assignments: AssignmentSummary,
}

/// Full report of one student with per-subject breakdowns.
#[derive(Serialize, utoipa::ToSchema)]
pub struct StudentReportResponse {
    pub student: StudentResponse,
    pub attendance: AttendanceSummary,
    /// Only subjects the student has attendance records for, by name.
    pub attendance_by_subject: Vec<SubjectAttendanceItem>,
    pub assignments: AssignmentSummary,
    /// Only subjects with at least one assignment, by name.
    pub assignments_by_subject: Vec<SubjectAssignmentItem>,
}

impl StudentReportResponse {
    pub fn new(student: StudentResponse, report: StudentReport) -> Self {
        Self {
            student,
            attendance: report.attendance.into(),
            attendance_by_subject: report
                .attendance_by_subject
                .into_iter()
                .map(Into::into)
                .collect(),
            assignments: report.assignments.into(),
            assignments_by_subject: report
                .assignments_by_subject
                .into_iter()
                .map(Into::into)
                .collect(),
        }
    }
}
