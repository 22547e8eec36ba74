use axum::{Json, extract::State};
use sea_orm::*;
use tracing::instrument;

use crate::entity::{admin, professor, student};
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::AppJson;
use crate::models::auth::{LoginRequest, LoginResponse, MeResponse, validate_login_request};
use crate::permissions::{Role, permissions_for};
use crate::state::AppState;
use crate::utils::{hash, jwt};

/// Credentials row of whichever account table the login resolved to.
struct Account {
    id: i32,
    login: String,
    name: String,
    password_hash: String,
    role: Role,
    is_cr: bool,
}

/// Check the password and sign a token for the account.
fn issue_token(
    state: &AppState,
    password: &str,
    account: Account,
) -> Result<Json<LoginResponse>, AppError> {
    let is_valid = hash::verify_password(password, &account.password_hash)
        .map_err(|e| AppError::Internal(format!("Password verify error: {}", e)))?;
    if !is_valid {
        return Err(AppError::InvalidCredentials);
    }

    let permissions = permissions_for(account.role, account.is_cr);
    let token = jwt::sign(
        jwt::TokenSubject {
            uid: account.id,
            login: &account.login,
            name: &account.name,
            role: account.role.as_str(),
            permissions: permissions.clone(),
        },
        &state.config.auth.jwt_secret,
        state.config.auth.token_ttl_hours,
    )
    .map_err(|e| AppError::Internal(format!("JWT sign error: {}", e)))?;

    tracing::info!(role = %account.role, login = %account.login, "Login succeeded");

    Ok(Json(LoginResponse {
        token,
        id: account.id,
        login: account.login,
        name: account.name,
        role: account.role,
        permissions,
    }))
}

/// Log in as a student with roll number and password.
#[utoipa::path(
    post,
    path = "/student/login",
    tag = "Auth",
    operation_id = "loginStudent",
    summary = "Log in as a student",
    description = "Authenticates a student by roll number. Class representatives receive the attendance marking permissions in addition to the student ones.",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = LoginResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Invalid credentials (INVALID_CREDENTIALS)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, payload), fields(login = %payload.login))]
pub async fn login_student(
    State(state): State<AppState>,
    AppJson(payload): AppJson<LoginRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    validate_login_request(&payload)?;

    let account = student::Entity::find()
        .filter(student::Column::Roll.eq(payload.login.trim()))
        .one(&state.db)
        .await?
        .ok_or(AppError::InvalidCredentials)?;

    issue_token(
        &state,
        &payload.password,
        Account {
            id: account.id,
            login: account.roll,
            name: account.name,
            password_hash: account.password,
            role: Role::Student,
            is_cr: account.is_cr,
        },
    )
}

/// Log in as a professor with staff code and password.
#[utoipa::path(
    post,
    path = "/professor/login",
    tag = "Auth",
    operation_id = "loginProfessor",
    summary = "Log in as a professor",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = LoginResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Invalid credentials (INVALID_CREDENTIALS)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, payload), fields(login = %payload.login))]
pub async fn login_professor(
    State(state): State<AppState>,
    AppJson(payload): AppJson<LoginRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    validate_login_request(&payload)?;

    let account = professor::Entity::find()
        .filter(professor::Column::Code.eq(payload.login.trim()))
        .one(&state.db)
        .await?
        .ok_or(AppError::InvalidCredentials)?;

    issue_token(
        &state,
        &payload.password,
        Account {
            id: account.id,
            login: account.code,
            name: account.name,
            password_hash: account.password,
            role: Role::Professor,
            is_cr: false,
        },
    )
}

/// Log in as an administrator.
#[utoipa::path(
    post,
    path = "/admin/login",
    tag = "Auth",
    operation_id = "loginAdmin",
    summary = "Log in as an administrator",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = LoginResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Invalid credentials (INVALID_CREDENTIALS)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, payload), fields(login = %payload.login))]
pub async fn login_admin(
    State(state): State<AppState>,
    AppJson(payload): AppJson<LoginRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    validate_login_request(&payload)?;

    let account = admin::Entity::find()
        .filter(admin::Column::Username.eq(payload.login.trim()))
        .one(&state.db)
        .await?
        .ok_or(AppError::InvalidCredentials)?;

    issue_token(
        &state,
        &payload.password,
        Account {
            id: account.id,
            name: account.username.clone(),
            login: account.username,
            password_hash: account.password,
            role: Role::Admin,
            is_cr: false,
        },
    )
}

/// Return the current authenticated principal.
#[utoipa::path(
    get,
    path = "/me",
    tag = "Auth",
    operation_id = "getCurrentUser",
    summary = "Get current principal",
    responses(
        (status = 200, description = "Current principal", body = MeResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(auth_user), fields(user_id = auth_user.user_id, role = %auth_user.role))]
pub async fn me(auth_user: AuthUser) -> Json<MeResponse> {
    Json(MeResponse {
        id: auth_user.user_id,
        login: auth_user.login,
        name: auth_user.name,
        role: auth_user.role,
        permissions: auth_user.permissions,
    })
}
