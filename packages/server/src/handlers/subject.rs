use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use sea_orm::sea_query::LockType;
use sea_orm::*;
use tracing::instrument;

use crate::cascade;
use crate::documents::release_documents;
use crate::entity::{assignment, attendance_session, subject};
use crate::error::{AppError, ErrorBody, conflict_on_unique};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::AppJson;
use crate::models::subject::*;
use crate::permissions::SUBJECT_MANAGE;
use crate::state::AppState;

pub(crate) async fn find_subject<C: ConnectionTrait>(
    db: &C,
    id: i32,
) -> Result<subject::Model, AppError> {
    subject::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("Subject not found".into()))
}

#[utoipa::path(
    get,
    path = "/",
    tag = "Subjects",
    operation_id = "listSubjects",
    summary = "List subjects",
    description = "Returns all subjects ordered by name. Any authenticated user may list them.",
    responses(
        (status = 200, description = "List of subjects", body = SubjectListResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, _auth_user))]
pub async fn list_subjects(
    _auth_user: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<SubjectListResponse>, AppError> {
    let rows = subject::Entity::find()
        .order_by_asc(subject::Column::Name)
        .all(&state.db)
        .await?;
    Ok(Json(SubjectListResponse {
        data: rows.into_iter().map(Into::into).collect(),
    }))
}

#[utoipa::path(
    post,
    path = "/",
    tag = "Subjects",
    operation_id = "createSubject",
    summary = "Create a subject",
    description = "Requires `subject:manage` permission.",
    request_body = CreateSubjectRequest,
    responses(
        (status = 201, description = "Subject created", body = SubjectResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 409, description = "Name already taken (CONFLICT)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(name = %payload.name))]
pub async fn create_subject(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<CreateSubjectRequest>,
) -> Result<impl IntoResponse, AppError> {
    auth_user.require_permission(SUBJECT_MANAGE)?;
    validate_create_subject(&payload)?;

    let name = payload.name.trim().to_string();
    let model = subject::ActiveModel {
        name: Set(name.clone()),
        subject_type: Set(payload.subject_type),
        created_at: Set(chrono::Utc::now()),
        ..Default::default()
    }
    .insert(&state.db)
    .await
    .map_err(|e| conflict_on_unique(e, format!("Subject '{name}' already exists")))?;

    tracing::info!(subject_id = model.id, "Subject created");
    Ok((StatusCode::CREATED, Json(SubjectResponse::from(model))))
}

#[utoipa::path(
    get,
    path = "/{id}",
    tag = "Subjects",
    operation_id = "getSubject",
    summary = "Get a subject by ID",
    params(("id" = i32, Path, description = "Subject ID")),
    responses(
        (status = 200, description = "Subject", body = SubjectResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Subject not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, _auth_user), fields(id))]
pub async fn get_subject(
    _auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<SubjectResponse>, AppError> {
    Ok(Json(find_subject(&state.db, id).await?.into()))
}

#[utoipa::path(
    patch,
    path = "/{id}",
    tag = "Subjects",
    operation_id = "updateSubject",
    summary = "Update a subject",
    description = "Renames a subject or changes its type. Existing sessions keep the type they were marked with. Requires `subject:manage` permission.",
    params(("id" = i32, Path, description = "Subject ID")),
    request_body = UpdateSubjectRequest,
    responses(
        (status = 200, description = "Subject updated", body = SubjectResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Subject not found (NOT_FOUND)", body = ErrorBody),
        (status = 409, description = "Name already taken (CONFLICT)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(id))]
pub async fn update_subject(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    AppJson(payload): AppJson<UpdateSubjectRequest>,
) -> Result<Json<SubjectResponse>, AppError> {
    auth_user.require_permission(SUBJECT_MANAGE)?;
    validate_update_subject(&payload)?;

    if payload == UpdateSubjectRequest::default() {
        return Ok(Json(find_subject(&state.db, id).await?.into()));
    }

    let txn = state.db.begin().await?;
    let existing = subject::Entity::find_by_id(id)
        .lock(LockType::Update)
        .one(&txn)
        .await?
        .ok_or_else(|| AppError::NotFound("Subject not found".into()))?;
    let mut active: subject::ActiveModel = existing.into();

    if let Some(ref name) = payload.name {
        active.name = Set(name.trim().to_string());
    }
    if let Some(subject_type) = payload.subject_type {
        active.subject_type = Set(subject_type);
    }

    let model = active
        .update(&txn)
        .await
        .map_err(|e| conflict_on_unique(e, "Subject name is already taken"))?;
    txn.commit().await?;

    Ok(Json(model.into()))
}

#[utoipa::path(
    delete,
    path = "/{id}",
    tag = "Subjects",
    operation_id = "deleteSubject",
    summary = "Delete a subject",
    description = "Deletes a subject with its attendance sessions (and records) and assignments (and submissions). Requires `subject:manage` permission.",
    params(("id" = i32, Path, description = "Subject ID")),
    responses(
        (status = 204, description = "Subject deleted"),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Subject not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(id))]
pub async fn delete_subject(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, AppError> {
    auth_user.require_permission(SUBJECT_MANAGE)?;

    let txn = state.db.begin().await?;
    subject::Entity::find_by_id(id)
        .lock(LockType::Update)
        .one(&txn)
        .await?
        .ok_or_else(|| AppError::NotFound("Subject not found".into()))?;

    let mut removed = cascade::delete_sessions(
        &txn,
        Condition::all().add(attendance_session::Column::SubjectId.eq(id)),
    )
    .await?;
    removed.merge(
        cascade::delete_assignments(
            &txn,
            Condition::all().add(assignment::Column::SubjectId.eq(id)),
        )
        .await?,
    );
    subject::Entity::delete_by_id(id).exec(&txn).await?;
    txn.commit().await?;

    tracing::info!(
        subject_id = id,
        sessions = removed.attendance_sessions,
        assignments = removed.assignments,
        "Subject deleted"
    );
    release_documents(&state.db, &*state.documents, removed.document_keys).await;

    Ok(StatusCode::NO_CONTENT)
}
