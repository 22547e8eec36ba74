use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::shared::{validate_login_id, validate_name, validate_password};
use crate::entity::professor;
use crate::error::AppError;

#[derive(Deserialize, utoipa::ToSchema)]
pub struct CreateProfessorRequest {
    /// Staff code used to log in.
    #[schema(example = "P103")]
    pub code: String,
    #[schema(example = "Dr. Meera Iyer")]
    pub name: String,
    pub password: String,
}

#[derive(Deserialize, Default, PartialEq, utoipa::ToSchema)]
pub struct UpdateProfessorRequest {
    pub code: Option<String>,
    pub name: Option<String>,
    pub password: Option<String>,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct ProfessorResponse {
    #[schema(example = 1)]
    pub id: i32,
    #[schema(example = "P101")]
    pub code: String,
    #[schema(example = "Dr. Rao")]
    pub name: String,
    pub created_at: DateTime<Utc>,
}

impl From<professor::Model> for ProfessorResponse {
    fn from(m: professor::Model) -> Self {
        Self {
            id: m.id,
            code: m.code,
            name: m.name,
            created_at: m.created_at,
        }
    }
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct ProfessorListResponse {
    pub data: Vec<ProfessorResponse>,
}

pub fn validate_create_professor(req: &CreateProfessorRequest) -> Result<(), AppError> {
    validate_login_id(&req.code, "Code")?;
    validate_name(&req.name, "Name")?;
    validate_password(&req.password)
}

pub fn validate_update_professor(req: &UpdateProfessorRequest) -> Result<(), AppError> {
    if let Some(code) = &req.code {
        validate_login_id(code, "Code")?;
    }
    if let Some(name) = &req.name {
        validate_name(name, "Name")?;
    }
    if let Some(password) = &req.password {
        validate_password(password)?;
    }
    Ok(())
}
