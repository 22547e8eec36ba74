use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use sea_orm::prelude::Expr;
use sea_orm::sea_query::{Func, LikeExpr};
use sea_orm::*;
use tracing::instrument;

use crate::attendance::AttendanceLedger;
use crate::cascade;
use crate::documents::release_documents;
use crate::entity::student;
use crate::error::{AppError, ErrorBody, conflict_on_unique};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::AppJson;
use crate::models::attendance::StudentAttendanceResponse;
use crate::models::shared::{Pagination, escape_like, page_params};
use crate::models::student::*;
use crate::permissions::{ATTENDANCE_VIEW_ALL, STUDENT_LIST, STUDENT_MANAGE};
use crate::reporting::ReportService;
use crate::state::AppState;
use crate::utils::hash;

pub(crate) async fn find_student<C: ConnectionTrait>(
    db: &C,
    id: i32,
) -> Result<student::Model, AppError> {
    student::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("Student not found".into()))
}

async fn find_student_for_update<C: ConnectionTrait>(
    db: &C,
    id: i32,
) -> Result<student::Model, AppError> {
    student::Entity::find_by_id(id)
        .lock(sea_orm::sea_query::LockType::Update)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("Student not found".into()))
}

/// A student may always see their own data; staff need `permission`.
fn require_self_or(auth_user: &AuthUser, student_id: i32, permission: &str) -> Result<(), AppError> {
    if auth_user.require_student().ok() == Some(student_id) {
        return Ok(());
    }
    auth_user.require_permission(permission)
}

#[utoipa::path(
    get,
    path = "/",
    tag = "Students",
    operation_id = "listStudents",
    summary = "List students",
    description = "Returns students ordered by roll number. Requires `student:list` permission.",
    params(StudentListQuery),
    responses(
        (status = 200, description = "List of students", body = StudentListResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user))]
pub async fn list_students(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Query(query): Query<StudentListQuery>,
) -> Result<Json<StudentListResponse>, AppError> {
    auth_user.require_permission(STUDENT_LIST)?;
    let (page, per_page) = page_params(query.page, query.per_page);

    let mut select = student::Entity::find();
    if let Some(group) = query.group {
        select = select.filter(student::Column::GroupTag.eq(group));
    }
    if let Some(ref search) = query.search {
        let term = escape_like(search.trim());
        if !term.is_empty() {
            let pattern = format!("%{}%", term.to_lowercase());
            select = select.filter(
                Condition::any()
                    .add(
                        Expr::expr(Func::lower(Expr::col(student::Column::Roll)))
                            .like(LikeExpr::new(pattern.clone()).escape('\\')),
                    )
                    .add(
                        Expr::expr(Func::lower(Expr::col(student::Column::Name)))
                            .like(LikeExpr::new(pattern).escape('\\')),
                    ),
            );
        }
    }

    let total = select.clone().count(&state.db).await?;
    let rows = select
        .order_by_asc(student::Column::Roll)
        .offset((page - 1) * per_page)
        .limit(per_page)
        .all(&state.db)
        .await?;

    Ok(Json(StudentListResponse {
        data: rows.into_iter().map(Into::into).collect(),
        pagination: Pagination::new(page, per_page, total),
    }))
}

#[utoipa::path(
    post,
    path = "/",
    tag = "Students",
    operation_id = "createStudent",
    summary = "Create a student",
    description = "Creates a student account. Requires `student:manage` permission.",
    request_body = CreateStudentRequest,
    responses(
        (status = 201, description = "Student created", body = StudentResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 409, description = "Roll already taken (CONFLICT)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(roll = %payload.roll))]
pub async fn create_student(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<CreateStudentRequest>,
) -> Result<impl IntoResponse, AppError> {
    auth_user.require_permission(STUDENT_MANAGE)?;
    validate_create_student(&payload)?;

    let password = hash::hash_password(&payload.password)
        .map_err(|e| AppError::Internal(format!("Password hash error: {}", e)))?;

    let roll = payload.roll.trim().to_string();
    let new_student = student::ActiveModel {
        roll: Set(roll.clone()),
        name: Set(payload.name.trim().to_string()),
        password: Set(password),
        group_tag: Set(payload.group),
        is_cr: Set(payload.is_cr),
        created_at: Set(chrono::Utc::now()),
        ..Default::default()
    };

    let model = new_student
        .insert(&state.db)
        .await
        .map_err(|e| conflict_on_unique(e, format!("Roll '{roll}' is already taken")))?;

    tracing::info!(student_id = model.id, "Student created");
    Ok((StatusCode::CREATED, Json(StudentResponse::from(model))))
}

#[utoipa::path(
    get,
    path = "/{id}",
    tag = "Students",
    operation_id = "getStudent",
    summary = "Get a student by ID",
    description = "Students may read their own record; others need `student:list`.",
    params(("id" = i32, Path, description = "Student ID")),
    responses(
        (status = 200, description = "Student", body = StudentResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Student not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(id))]
pub async fn get_student(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<StudentResponse>, AppError> {
    require_self_or(&auth_user, id, STUDENT_LIST)?;
    let model = find_student(&state.db, id).await?;
    Ok(Json(model.into()))
}

#[utoipa::path(
    patch,
    path = "/{id}",
    tag = "Students",
    operation_id = "updateStudent",
    summary = "Update a student",
    description = "Partially updates a student. Requires `student:manage` permission.",
    params(("id" = i32, Path, description = "Student ID")),
    request_body = UpdateStudentRequest,
    responses(
        (status = 200, description = "Student updated", body = StudentResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Student not found (NOT_FOUND)", body = ErrorBody),
        (status = 409, description = "Roll already taken (CONFLICT)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(id))]
pub async fn update_student(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    AppJson(payload): AppJson<UpdateStudentRequest>,
) -> Result<Json<StudentResponse>, AppError> {
    auth_user.require_permission(STUDENT_MANAGE)?;
    validate_update_student(&payload)?;

    if payload == UpdateStudentRequest::default() {
        let existing = find_student(&state.db, id).await?;
        return Ok(Json(existing.into()));
    }

    let password = payload
        .password
        .as_deref()
        .map(hash::hash_password)
        .transpose()
        .map_err(|e| AppError::Internal(format!("Password hash error: {}", e)))?;

    let txn = state.db.begin().await?;
    let existing = find_student_for_update(&txn, id).await?;
    let mut active: student::ActiveModel = existing.into();

    if let Some(ref roll) = payload.roll {
        active.roll = Set(roll.trim().to_string());
    }
    if let Some(ref name) = payload.name {
        active.name = Set(name.trim().to_string());
    }
    if let Some(password) = password {
        active.password = Set(password);
    }
    if let Some(group) = payload.group {
        active.group_tag = Set(group);
    }
    if let Some(is_cr) = payload.is_cr {
        active.is_cr = Set(is_cr);
    }

    let model = active
        .update(&txn)
        .await
        .map_err(|e| conflict_on_unique(e, "Roll is already taken"))?;
    txn.commit().await?;

    Ok(Json(model.into()))
}

#[utoipa::path(
    delete,
    path = "/{id}",
    tag = "Students",
    operation_id = "deleteStudent",
    summary = "Delete a student",
    description = "Deletes a student with their attendance records and submissions. Sessions the student recorded as CR are kept with the attribution cleared. Requires `student:manage` permission.",
    params(("id" = i32, Path, description = "Student ID")),
    responses(
        (status = 204, description = "Student deleted"),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Student not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(id))]
pub async fn delete_student(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, AppError> {
    auth_user.require_permission(STUDENT_MANAGE)?;

    let txn = state.db.begin().await?;
    let _student = find_student_for_update(&txn, id).await?;
    let removed = cascade::detach_student(&txn, id).await?;
    student::Entity::delete_by_id(id).exec(&txn).await?;
    txn.commit().await?;

    tracing::info!(
        student_id = id,
        records = removed.attendance_records,
        submissions = removed.submissions,
        "Student deleted"
    );
    release_documents(&state.db, &*state.documents, removed.document_keys).await;

    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/{id}/attendance",
    tag = "Students",
    operation_id = "getStudentAttendance",
    summary = "Get a student's attendance",
    description = "Returns the student's attendance rows, newest first, with the overall percentage. Students may read their own; others need `attendance:view_all`.",
    params(("id" = i32, Path, description = "Student ID")),
    responses(
        (status = 200, description = "Attendance rows", body = StudentAttendanceResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Student not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(id))]
pub async fn get_student_attendance(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<StudentAttendanceResponse>, AppError> {
    require_self_or(&auth_user, id, ATTENDANCE_VIEW_ALL)?;
    find_student(&state.db, id).await?;
    Ok(Json(student_attendance(&state.db, id).await?))
}

pub(crate) async fn student_attendance<C: ConnectionTrait>(
    db: &C,
    student_id: i32,
) -> Result<StudentAttendanceResponse, AppError> {
    let summary = ReportService::new(db).attendance_summary(student_id).await?;
    let rows = AttendanceLedger::new(db).student_history(student_id).await?;
    Ok(StudentAttendanceResponse {
        student_id,
        summary: summary.into(),
        records: rows.into_iter().map(Into::into).collect(),
    })
}
