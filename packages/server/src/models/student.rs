use chrono::{DateTime, Utc};
use common::GroupTag;
use serde::{Deserialize, Serialize};

use super::shared::{Pagination, validate_login_id, validate_name, validate_password};
use crate::entity::student;
use crate::error::AppError;

#[derive(Deserialize, utoipa::ToSchema)]
pub struct CreateStudentRequest {
    #[schema(example = "IT2505")]
    pub roll: String,
    #[schema(example = "Esha Verma")]
    pub name: String,
    /// Initial password (8-128 characters).
    pub password: String,
    pub group: GroupTag,
    /// Whether the student is a class representative.
    #[serde(default)]
    pub is_cr: bool,
}

#[derive(Deserialize, Default, PartialEq, utoipa::ToSchema)]
pub struct UpdateStudentRequest {
    pub roll: Option<String>,
    pub name: Option<String>,
    /// New password; omitted keeps the current one.
    pub password: Option<String>,
    pub group: Option<GroupTag>,
    pub is_cr: Option<bool>,
}

/// Query parameters for listing students.
#[derive(Debug, Deserialize, utoipa::IntoParams)]
pub struct StudentListQuery {
    /// Only students of this group.
    pub group: Option<GroupTag>,
    /// Case-insensitive match on roll or name.
    #[param(example = "IT25")]
    pub search: Option<String>,
    /// Page number (1-indexed).
    #[param(example = 1)]
    pub page: Option<u64>,
    /// Items per page (1-100, default 20).
    #[param(example = 20)]
    pub per_page: Option<u64>,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct StudentResponse {
    #[schema(example = 1)]
    pub id: i32,
    #[schema(example = "IT2501")]
    pub roll: String,
    #[schema(example = "Aarav Sharma")]
    pub name: String,
    pub group: GroupTag,
    pub is_cr: bool,
    pub created_at: DateTime<Utc>,
}

impl From<student::Model> for StudentResponse {
    fn from(m: student::Model) -> Self {
        Self {
            id: m.id,
            roll: m.roll,
            name: m.name,
            group: m.group_tag,
            is_cr: m.is_cr,
            created_at: m.created_at,
        }
    }
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct StudentListResponse {
    pub data: Vec<StudentResponse>,
    pub pagination: Pagination,
}

pub fn validate_create_student(req: &CreateStudentRequest) -> Result<(), AppError> {
    validate_login_id(&req.roll, "Roll")?;
    validate_name(&req.name, "Name")?;
    validate_password(&req.password)
}

pub fn validate_update_student(req: &UpdateStudentRequest) -> Result<(), AppError> {
    if let Some(roll) = &req.roll {
        validate_login_id(roll, "Roll")?;
    }
    if let Some(name) = &req.name {
        validate_name(name, "Name")?;
    }
    if let Some(password) = &req.password {
        validate_password(password)?;
    }
    Ok(())
}
