use chrono::{DateTime, Utc};
use common::SubjectType;
use serde::{Deserialize, Serialize};

use super::shared::validate_name;
use crate::entity::subject;
use crate::error::AppError;

#[derive(Deserialize, utoipa::ToSchema)]
pub struct CreateSubjectRequest {
    #[schema(example = "Data Structures")]
    pub name: String,
    pub subject_type: SubjectType,
}

#[derive(Deserialize, Default, PartialEq, utoipa::ToSchema)]
pub struct UpdateSubjectRequest {
    pub name: Option<String>,
    pub subject_type: Option<SubjectType>,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct SubjectResponse {
    #[schema(example = 1)]
    pub id: i32,
    #[schema(example = "Data Structures")]
    pub name: String,
    pub subject_type: SubjectType,
    pub created_at: DateTime<Utc>,
}

impl From<subject::Model> for SubjectResponse {
    fn from(m: subject::Model) -> Self {
        Self {
            id: m.id,
            name: m.name,
            subject_type: m.subject_type,
            created_at: m.created_at,
        }
    }
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct SubjectListResponse {
    pub data: Vec<SubjectResponse>,
}

pub fn validate_create_subject(req: &CreateSubjectRequest) -> Result<(), AppError> {
    validate_name(&req.name, "Subject name")
}

pub fn validate_update_subject(req: &UpdateSubjectRequest) -> Result<(), AppError> {
    if let Some(name) = &req.name {
        validate_name(name, "Subject name")?;
    }
    Ok(())
}
