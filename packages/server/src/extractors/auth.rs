use axum::{extract::FromRequestParts, http::request::Parts};

use crate::error::AppError;
use crate::permissions::Role;
use crate::state::AppState;
use crate::utils::jwt;

/// Authenticated principal extracted from the `Authorization: Bearer <token>` header.
///
/// Add this as a handler parameter to require authentication.
/// Permission checks happen via `require_permission()` in the handler body.
#[derive(Debug)]
pub struct AuthUser {
    /// Row ID in the table of `role`.
    pub user_id: i32,
    /// Roll number, staff code or admin username.
    pub login: String,
    pub name: String,
    pub role: Role,
    pub permissions: Vec<String>,
}

impl AuthUser {
    pub fn has_permission(&self, permission: &str) -> bool {
        self.permissions.iter().any(|p| p == permission)
    }

    /// Returns `Ok(())` if the user has the given permission, `Err(PermissionDenied)` otherwise.
    pub fn require_permission(&self, permission: &str) -> Result<(), AppError> {
        if self.has_permission(permission) {
            Ok(())
        } else {
            Err(AppError::PermissionDenied)
        }
    }

    /// Returns `Ok(())` if the user has ANY of the given permissions.
    pub fn require_any_permission(&self, permissions: &[&str]) -> Result<(), AppError> {
        if permissions.iter().any(|perm| self.has_permission(perm)) {
            Ok(())
        } else {
            Err(AppError::PermissionDenied)
        }
    }

    /// The caller's student ID, for endpoints that act on "my" data.
    pub fn require_student(&self) -> Result<i32, AppError> {
        match self.role {
            Role::Student => Ok(self.user_id),
            _ => Err(AppError::PermissionDenied),
        }
    }
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get("Authorization")
            .and_then(|v| v.to_str().ok())
            .ok_or(AppError::TokenMissing)?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .ok_or(AppError::TokenInvalid)?;

        let claims = jwt::verify(token, &state.config.auth.jwt_secret)
            .map_err(|_| AppError::TokenInvalid)?;
        let role = claims
            .role
            .parse::<Role>()
            .map_err(|_| AppError::TokenInvalid)?;

        Ok(AuthUser {
            user_id: claims.uid,
            login: claims.sub,
            name: claims.name,
            role,
            permissions: claims.permissions,
        })
    }
}
