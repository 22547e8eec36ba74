use std::collections::BTreeSet;

use chrono::{DateTime, NaiveDate, Utc};
use common::{GroupQualifier, GroupTag, SubjectType};
use serde::{Deserialize, Serialize};

use super::shared::{double_option, validate_bulk_ids};
use crate::attendance::{SessionReportRow, SessionSummary, StudentAttendanceRow};
use crate::entity::attendance_session;
use crate::error::AppError;
use crate::reporting::Tally;

const MAX_ROSTER: usize = 1000;

/// Roster submitted by a class representative for one class meeting.
#[derive(Deserialize, utoipa::ToSchema)]
pub struct MarkAttendanceRequest {
    #[schema(example = 1)]
    pub subject_id: i32,
    #[schema(example = 1)]
    pub professor_id: i32,
    #[schema(value_type = String, format = Date, example = "2024-03-01")]
    pub date: NaiveDate,
    /// Defaults to the subject's own type.
    pub subject_type: Option<SubjectType>,
    /// Lab group the session covers. Defaults to `ALL`.
    #[serde(default)]
    pub group: GroupQualifier,
    /// IDs of the students present; every other cohort student is absent.
    #[schema(example = json!([1, 2]))]
    pub present_student_ids: Vec<i32>,
}

/// The roster is a set: repeated IDs collapse and only distinct IDs count
/// towards the cap.
pub fn validate_mark_request(req: &MarkAttendanceRequest) -> Result<(), AppError> {
    let distinct: BTreeSet<i32> = req.present_student_ids.iter().copied().collect();
    if distinct.len() > MAX_ROSTER {
        return Err(AppError::Validation(format!(
            "Too many present students: max {MAX_ROSTER}"
        )));
    }
    Ok(())
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct SessionResponse {
    #[schema(example = 1)]
    pub id: i32,
    pub subject_id: i32,
    pub professor_id: i32,
    #[schema(value_type = String, format = Date, example = "2024-03-01")]
    pub date: NaiveDate,
    pub subject_type: SubjectType,
    pub group: GroupQualifier,
    /// Class representative who recorded the session (null once deleted).
    pub recorded_by_cr_id: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<attendance_session::Model> for SessionResponse {
    fn from(m: attendance_session::Model) -> Self {
        Self {
            id: m.id,
            subject_id: m.subject_id,
            professor_id: m.professor_id,
            date: m.date,
            subject_type: m.subject_type,
            group: m.group_qualifier,
            recorded_by_cr_id: m.recorded_by_cr_id,
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct MarkAttendanceResponse {
    pub session: SessionResponse,
    /// False when an existing session's roster was replaced.
    pub created: bool,
    #[schema(example = 4)]
    pub cohort_size: usize,
    #[schema(example = 2)]
    pub present_count: usize,
    #[schema(example = 2)]
    pub absent_count: usize,
}

/// Query parameters for searching sessions.
#[derive(Debug, Deserialize, utoipa::IntoParams)]
pub struct SessionSearchQuery {
    pub professor_id: Option<i32>,
    pub subject_id: Option<i32>,
    #[param(value_type = Option<String>, format = Date, example = "2024-03-01")]
    pub date: Option<NaiveDate>,
    pub subject_type: Option<SubjectType>,
    pub group: Option<GroupQualifier>,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct SessionListItem {
    #[serde(flatten)]
    pub session: SessionResponse,
    pub present: u64,
    pub total: u64,
}

impl From<SessionSummary> for SessionListItem {
    fn from(s: SessionSummary) -> Self {
        Self {
            session: s.session.into(),
            present: s.present,
            total: s.total,
        }
    }
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct SessionListResponse {
    pub data: Vec<SessionListItem>,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct SessionRecordResponse {
    pub record_id: i32,
    pub student_id: i32,
    #[schema(example = "IT2501")]
    pub roll: String,
    pub name: String,
    pub group: GroupTag,
    pub present: bool,
    pub note: Option<String>,
}

impl From<SessionReportRow> for SessionRecordResponse {
    fn from(r: SessionReportRow) -> Self {
        Self {
            record_id: r.record_id,
            student_id: r.student_id,
            roll: r.roll,
            name: r.name,
            group: r.group,
            present: r.present,
            note: r.note,
        }
    }
}

/// A session together with its records in roll-call order.
#[derive(Serialize, utoipa::ToSchema)]
pub struct SessionDetailResponse {
    pub session: SessionResponse,
    pub records: Vec<SessionRecordResponse>,
    pub present: u64,
    pub total: u64,
    #[schema(example = 50.0)]
    pub percentage: f64,
}

impl SessionDetailResponse {
    pub fn new(session: attendance_session::Model, rows: Vec<SessionReportRow>) -> Self {
        let mut tally = Tally::default();
        for row in &rows {
            tally.record(row.present);
        }
        Self {
            session: session.into(),
            records: rows.into_iter().map(Into::into).collect(),
            present: tally.hits,
            total: tally.total,
            percentage: tally.percentage(),
        }
    }
}

#[derive(Deserialize, utoipa::ToSchema)]
pub struct RecordEditItem {
    pub record_id: i32,
    pub present: bool,
    /// Absent keeps the note; `null` clears it.
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub note: Option<Option<String>>,
}

#[derive(Deserialize, utoipa::ToSchema)]
pub struct EditRecordsRequest {
    pub records: Vec<RecordEditItem>,
}

pub fn validate_edit_records(req: &EditRecordsRequest) -> Result<(), AppError> {
    if req.records.is_empty() {
        return Err(AppError::Validation("records must not be empty".into()));
    }
    let ids: Vec<i32> = req.records.iter().map(|r| r.record_id).collect();
    validate_bulk_ids(&ids, "record", MAX_ROSTER)?;
    for item in &req.records {
        if let Some(Some(note)) = &item.note
            && note.chars().count() > 500
        {
            return Err(AppError::Validation(
                "Note must be at most 500 characters".into(),
            ));
        }
    }
    Ok(())
}

/// Attendance totals with the derived percentage.
#[derive(Serialize, utoipa::ToSchema)]
pub struct AttendanceSummary {
    #[schema(example = 7)]
    pub attended: u64,
    #[schema(example = 10)]
    pub total: u64,
    #[schema(example = 70.0)]
    pub percentage: f64,
}

impl From<Tally> for AttendanceSummary {
    fn from(t: Tally) -> Self {
        Self {
            attended: t.hits,
            total: t.total,
            percentage: t.percentage(),
        }
    }
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct StudentAttendanceItem {
    pub session_id: i32,
    #[schema(value_type = String, format = Date, example = "2024-03-01")]
    pub date: NaiveDate,
    pub subject_id: i32,
    #[schema(example = "Data Structures")]
    pub subject_name: String,
    pub subject_type: SubjectType,
    pub professor_name: String,
    pub group: GroupQualifier,
    pub present: bool,
    pub note: Option<String>,
}

impl From<StudentAttendanceRow> for StudentAttendanceItem {
    fn from(r: StudentAttendanceRow) -> Self {
        Self {
            session_id: r.session_id,
            date: r.date,
            subject_id: r.subject_id,
            subject_name: r.subject_name,
            subject_type: r.subject_type,
            professor_name: r.professor_name,
            group: r.group,
            present: r.present,
            note: r.note,
        }
    }
}

/// A student's attendance rows, newest first.
#[derive(Serialize, utoipa::ToSchema)]
pub struct StudentAttendanceResponse {
    pub student_id: i32,
    pub summary: AttendanceSummary,
    pub records: Vec<StudentAttendanceItem>,
}
