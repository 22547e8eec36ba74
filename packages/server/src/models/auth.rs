use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::permissions::Role;

/// Request body for all three login endpoints.
#[derive(Deserialize, utoipa::ToSchema)]
pub struct LoginRequest {
    /// Roll number (students), staff code (professors) or username (admins).
    #[schema(example = "IT2501")]
    pub login: String,
    /// Account password.
    #[schema(example = "s3cure_P@ss!")]
    pub password: String,
}

pub fn validate_login_request(payload: &LoginRequest) -> Result<(), AppError> {
    if payload.login.trim().is_empty() {
        return Err(AppError::Validation("Login must not be empty".into()));
    }
    if payload.password.is_empty() {
        return Err(AppError::Validation("Password must not be empty".into()));
    }
    Ok(())
}

/// Successful login response.
#[derive(Serialize, utoipa::ToSchema)]
pub struct LoginResponse {
    /// JWT bearer token.
    #[schema(example = "eyJhbGciOiJIUzI1NiIsInR5cCI6IkpXVCJ9...")]
    pub token: String,
    /// Row ID of the account.
    #[schema(example = 3)]
    pub id: i32,
    #[schema(example = "IT2501")]
    pub login: String,
    #[schema(example = "Aarav Sharma")]
    pub name: String,
    pub role: Role,
    /// Permissions granted to the account.
    #[schema(example = json!(["assignment:submit"]))]
    pub permissions: Vec<String>,
}

/// Current authenticated principal.
#[derive(Serialize, utoipa::ToSchema)]
pub struct MeResponse {
    #[schema(example = 3)]
    pub id: i32,
    #[schema(example = "IT2501")]
    pub login: String,
    #[schema(example = "Aarav Sharma")]
    pub name: String,
    pub role: Role,
    #[schema(example = json!(["assignment:submit"]))]
    pub permissions: Vec<String>,
}
