use chrono::{DateTime, Utc};
use common::GroupTag;
use serde::{Deserialize, Serialize};

use super::shared::validate_title;
use crate::entity::announcement;
use crate::error::AppError;

#[derive(Deserialize, utoipa::ToSchema)]
pub struct CreateAnnouncementRequest {
    #[schema(example = "Lab moved to Friday")]
    pub title: String,
    /// Body in Markdown.
    pub description: String,
    /// Addressed group; omitted or null addresses the whole cohort.
    pub group: Option<GroupTag>,
}

pub fn validate_create_announcement(req: &CreateAnnouncementRequest) -> Result<(), AppError> {
    validate_title(&req.title)?;
    if req.description.trim().is_empty() || req.description.len() > 100_000 {
        return Err(AppError::Validation(
            "Description must be non-empty and at most 100KB".into(),
        ));
    }
    Ok(())
}

/// Query parameters for listing announcements.
#[derive(Debug, Deserialize, utoipa::IntoParams)]
pub struct AnnouncementListQuery {
    /// Staff only: restrict to cohort-wide announcements plus this group's.
    pub group: Option<GroupTag>,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct AnnouncementResponse {
    pub id: i32,
    pub title: String,
    pub description: String,
    /// Null for cohort-wide announcements.
    pub group: Option<GroupTag>,
    #[schema(example = "Admin")]
    pub posted_by: String,
    /// File name of the attachment, served at `/announcements/{id}/document`.
    #[schema(example = "timetable.pdf")]
    pub document_name: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<announcement::Model> for AnnouncementResponse {
    fn from(m: announcement::Model) -> Self {
        Self {
            id: m.id,
            title: m.title,
            description: m.description,
            group: m.group_tag,
            posted_by: m.posted_by,
            document_name: m.document_name,
            created_at: m.created_at,
        }
    }
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct AnnouncementListResponse {
    pub data: Vec<AnnouncementResponse>,
}
