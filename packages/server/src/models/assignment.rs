use chrono::{DateTime, NaiveDate, Utc};
use common::{AssignmentType, GroupTag, SubmissionStatus};
use serde::{Deserialize, Serialize};

use super::shared::{validate_bulk_ids, validate_title};
use crate::entity::{assignment, assignment_submission};
use crate::error::AppError;

#[derive(Deserialize, utoipa::ToSchema)]
pub struct CreateAssignmentRequest {
    #[schema(example = "Linked list exercises")]
    pub title: String,
    pub subject_id: i32,
    /// Required for admins; professors always create assignments as themselves.
    pub professor_id: Option<i32>,
    #[schema(value_type = String, format = Date, example = "2024-03-15")]
    pub due_date: NaiveDate,
    pub assignment_type: AssignmentType,
}

pub fn validate_create_assignment(req: &CreateAssignmentRequest) -> Result<(), AppError> {
    validate_title(&req.title)
}

/// Query parameters for listing assignments.
#[derive(Debug, Deserialize, utoipa::IntoParams)]
pub struct AssignmentListQuery {
    pub professor_id: Option<i32>,
    pub subject_id: Option<i32>,
    pub assignment_type: Option<AssignmentType>,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct AssignmentResponse {
    #[schema(example = 1)]
    pub id: i32,
    pub title: String,
    pub subject_id: i32,
    pub professor_id: i32,
    #[schema(value_type = String, format = Date, example = "2024-03-15")]
    pub due_date: NaiveDate,
    pub assignment_type: AssignmentType,
    /// Original name of the attached brief, if one was uploaded.
    pub document_name: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<assignment::Model> for AssignmentResponse {
    fn from(m: assignment::Model) -> Self {
        Self {
            id: m.id,
            title: m.title,
            subject_id: m.subject_id,
            professor_id: m.professor_id,
            due_date: m.due_date,
            assignment_type: m.assignment_type,
            document_name: m.document_name,
            created_at: m.created_at,
        }
    }
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct AssignmentListResponse {
    pub data: Vec<AssignmentResponse>,
}

/// An assignment as seen by one student.
#[derive(Serialize, utoipa::ToSchema)]
pub struct MyAssignmentItem {
    #[serde(flatten)]
    pub assignment: AssignmentResponse,
    /// Effective status for today.
    pub status: SubmissionStatus,
    pub file_name: Option<String>,
    pub submitted_at: Option<DateTime<Utc>>,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct MyAssignmentListResponse {
    pub data: Vec<MyAssignmentItem>,
}

/// One student's row in an assignment's roster.
#[derive(Serialize, utoipa::ToSchema)]
pub struct SubmissionRosterItem {
    pub student_id: i32,
    #[schema(example = "IT2501")]
    pub roll: String,
    pub name: String,
    pub group: GroupTag,
    /// Effective status for today.
    pub status: SubmissionStatus,
    pub file_name: Option<String>,
    pub submitted_at: Option<DateTime<Utc>>,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct SubmissionRosterResponse {
    pub assignment: AssignmentResponse,
    pub submissions: Vec<SubmissionRosterItem>,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct SubmissionResponse {
    pub assignment_id: i32,
    pub student_id: i32,
    pub status: SubmissionStatus,
    pub file_name: Option<String>,
    pub submitted_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
}

impl From<assignment_submission::Model> for SubmissionResponse {
    fn from(m: assignment_submission::Model) -> Self {
        Self {
            assignment_id: m.assignment_id,
            student_id: m.student_id,
            status: m.status,
            file_name: m.file_name,
            submitted_at: m.submitted_at,
            updated_at: m.updated_at,
        }
    }
}

#[derive(Deserialize, utoipa::ToSchema)]
pub struct SubmissionMark {
    pub student_id: i32,
    pub status: SubmissionStatus,
}

/// Bulk status update for an assignment's roster.
#[derive(Deserialize, utoipa::ToSchema)]
pub struct MarkSubmissionsRequest {
    pub statuses: Vec<SubmissionMark>,
}

pub fn validate_mark_submissions(req: &MarkSubmissionsRequest) -> Result<(), AppError> {
    if req.statuses.is_empty() {
        return Err(AppError::Validation("statuses must not be empty".into()));
    }
    let ids: Vec<i32> = req.statuses.iter().map(|s| s.student_id).collect();
    validate_bulk_ids(&ids, "student", 1000)
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct MarkSubmissionsResponse {
    pub data: Vec<SubmissionResponse>,
}
