use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use sea_orm::sea_query::LockType;
use sea_orm::*;
use tracing::instrument;

use crate::cascade;
use crate::documents::release_documents;
use crate::entity::{assignment, attendance_session, professor};
use crate::error::{AppError, ErrorBody, conflict_on_unique};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::AppJson;
use crate::models::professor::*;
use crate::permissions::PROFESSOR_MANAGE;
use crate::state::AppState;
use crate::utils::hash;

pub(crate) async fn find_professor<C: ConnectionTrait>(
    db: &C,
    id: i32,
) -> Result<professor::Model, AppError> {
    professor::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("Professor not found".into()))
}

#[utoipa::path(
    get,
    path = "/",
    tag = "Professors",
    operation_id = "listProfessors",
    summary = "List professors",
    description = "Returns all professors ordered by code. Any authenticated user may list them.",
    responses(
        (status = 200, description = "List of professors", body = ProfessorListResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, _auth_user))]
pub async fn list_professors(
    _auth_user: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<ProfessorListResponse>, AppError> {
    let rows = professor::Entity::find()
        .order_by_asc(professor::Column::Code)
        .all(&state.db)
        .await?;
    Ok(Json(ProfessorListResponse {
        data: rows.into_iter().map(Into::into).collect(),
    }))
}

#[utoipa::path(
    post,
    path = "/",
    tag = "Professors",
    operation_id = "createProfessor",
    summary = "Create a professor",
    description = "Creates a professor account. Requires `professor:manage` permission.",
    request_body = CreateProfessorRequest,
    responses(
        (status = 201, description = "Professor created", body = ProfessorResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 409, description = "Code already taken (CONFLICT)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(code = %payload.code))]
pub async fn create_professor(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<CreateProfessorRequest>,
) -> Result<impl IntoResponse, AppError> {
    auth_user.require_permission(PROFESSOR_MANAGE)?;
    validate_create_professor(&payload)?;

    let password = hash::hash_password(&payload.password)
        .map_err(|e| AppError::Internal(format!("Password hash error: {}", e)))?;

    let code = payload.code.trim().to_string();
    let model = professor::ActiveModel {
        code: Set(code.clone()),
        name: Set(payload.name.trim().to_string()),
        password: Set(password),
        created_at: Set(chrono::Utc::now()),
        ..Default::default()
    }
    .insert(&state.db)
    .await
    .map_err(|e| conflict_on_unique(e, format!("Code '{code}' is already taken")))?;

    tracing::info!(professor_id = model.id, "Professor created");
    Ok((StatusCode::CREATED, Json(ProfessorResponse::from(model))))
}

#[utoipa::path(
    get,
    path = "/{id}",
    tag = "Professors",
    operation_id = "getProfessor",
    summary = "Get a professor by ID",
    params(("id" = i32, Path, description = "Professor ID")),
    responses(
        (status = 200, description = "Professor", body = ProfessorResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Professor not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, _auth_user), fields(id))]
pub async fn get_professor(
    _auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<ProfessorResponse>, AppError> {
    Ok(Json(find_professor(&state.db, id).await?.into()))
}

#[utoipa::path(
    patch,
    path = "/{id}",
    tag = "Professors",
    operation_id = "updateProfessor",
    summary = "Update a professor",
    description = "Partially updates a professor. Requires `professor:manage` permission.",
    params(("id" = i32, Path, description = "Professor ID")),
    request_body = UpdateProfessorRequest,
    responses(
        (status = 200, description = "Professor updated", body = ProfessorResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Professor not found (NOT_FOUND)", body = ErrorBody),
        (status = 409, description = "Code already taken (CONFLICT)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(id))]
pub async fn update_professor(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    AppJson(payload): AppJson<UpdateProfessorRequest>,
) -> Result<Json<ProfessorResponse>, AppError> {
    auth_user.require_permission(PROFESSOR_MANAGE)?;
    validate_update_professor(&payload)?;

    if payload == UpdateProfessorRequest::default() {
        return Ok(Json(find_professor(&state.db, id).await?.into()));
    }

    let password = payload
        .password
        .as_deref()
        .map(hash::hash_password)
        .transpose()
        .map_err(|e| AppError::Internal(format!("Password hash error: {}", e)))?;

    let txn = state.db.begin().await?;
    let existing = professor::Entity::find_by_id(id)
        .lock(LockType::Update)
        .one(&txn)
        .await?
        .ok_or_else(|| AppError::NotFound("Professor not found".into()))?;
    let mut active: professor::ActiveModel = existing.into();

    if let Some(ref code) = payload.code {
        active.code = Set(code.trim().to_string());
    }
    if let Some(ref name) = payload.name {
        active.name = Set(name.trim().to_string());
    }
    if let Some(password) = password {
        active.password = Set(password);
    }

    let model = active
        .update(&txn)
        .await
        .map_err(|e| conflict_on_unique(e, "Code is already taken"))?;
    txn.commit().await?;

    Ok(Json(model.into()))
}

#[utoipa::path(
    delete,
    path = "/{id}",
    tag = "Professors",
    operation_id = "deleteProfessor",
    summary = "Delete a professor",
    description = "Deletes a professor with their attendance sessions (and records) and assignments (and submissions). Requires `professor:manage` permission.",
    params(("id" = i32, Path, description = "Professor ID")),
    responses(
        (status = 204, description = "Professor deleted"),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Professor not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(id))]
pub async fn delete_professor(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, AppError> {
    auth_user.require_permission(PROFESSOR_MANAGE)?;

    let txn = state.db.begin().await?;
    professor::Entity::find_by_id(id)
        .lock(LockType::Update)
        .one(&txn)
        .await?
        .ok_or_else(|| AppError::NotFound("Professor not found".into()))?;

    let mut removed = cascade::delete_sessions(
        &txn,
        Condition::all().add(attendance_session::Column::ProfessorId.eq(id)),
    )
    .await?;
    removed.merge(
        cascade::delete_assignments(
            &txn,
            Condition::all().add(assignment::Column::ProfessorId.eq(id)),
        )
        .await?,
    );
    professor::Entity::delete_by_id(id).exec(&txn).await?;
    txn.commit().await?;

    tracing::info!(
        professor_id = id,
        sessions = removed.attendance_sessions,
        assignments = removed.assignments,
        "Professor deleted"
    );
    release_documents(&state.db, &*state.documents, removed.document_keys).await;

    Ok(StatusCode::NO_CONTENT)
}
