use std::collections::HashMap;

use axum::Json;
use axum::extract::{Multipart, Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use chrono::Utc;
use common::{AssignmentType, SubmissionStatus};
use sea_orm::sea_query::{LockType, OnConflict};
use sea_orm::*;
use tracing::instrument;

use super::professor::find_professor;
use super::student::find_student;
use super::subject::find_subject;
use crate::cascade;
use crate::documents::{download_response, read_upload, release_documents};
use crate::entity::{assignment, assignment_submission, student};
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::AppJson;
use crate::models::assignment::*;
use crate::permissions::{
    ASSIGNMENT_CREATE, ASSIGNMENT_SUBMIT, Role, SUBMISSION_MARK, SUBMISSION_MARK_OFFLINE,
    SUBMISSION_VIEW_ALL,
};
use crate::state::AppState;

async fn find_assignment<C: ConnectionTrait>(
    db: &C,
    id: i32,
) -> Result<assignment::Model, AppError> {
    assignment::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("Assignment not found".into()))
}

/// Professors manage only their own assignments; admins manage all.
fn ensure_owner(auth_user: &AuthUser, assignment: &assignment::Model) -> Result<(), AppError> {
    match auth_user.role {
        Role::Professor if assignment.professor_id != auth_user.user_id => {
            Err(AppError::PermissionDenied)
        }
        _ => Ok(()),
    }
}

fn today() -> chrono::NaiveDate {
    Utc::now().date_naive()
}

#[utoipa::path(
    post,
    path = "/",
    tag = "Assignments",
    operation_id = "createAssignment",
    summary = "Create an assignment",
    description = "Professors create assignments as themselves; admins must name the professor. Requires `assignment:create` permission.",
    request_body = CreateAssignmentRequest,
    responses(
        (status = 201, description = "Assignment created", body = AssignmentResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Subject or professor not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(title = %payload.title))]
pub async fn create_assignment(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<CreateAssignmentRequest>,
) -> Result<impl IntoResponse, AppError> {
    auth_user.require_permission(ASSIGNMENT_CREATE)?;
    validate_create_assignment(&payload)?;

    let professor_id = match auth_user.role {
        Role::Professor => auth_user.user_id,
        _ => payload
            .professor_id
            .ok_or_else(|| AppError::Validation("professor_id is required".into()))?,
    };
    find_subject(&state.db, payload.subject_id).await?;
    find_professor(&state.db, professor_id).await?;

    let model = assignment::ActiveModel {
        title: Set(payload.title.trim().to_string()),
        subject_id: Set(payload.subject_id),
        professor_id: Set(professor_id),
        due_date: Set(payload.due_date),
        assignment_type: Set(payload.assignment_type),
        document_key: Set(None),
        document_name: Set(None),
        created_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(&state.db)
    .await?;

    tracing::info!(assignment_id = model.id, professor_id, "Assignment created");
    Ok((StatusCode::CREATED, Json(AssignmentResponse::from(model))))
}

#[utoipa::path(
    get,
    path = "/",
    tag = "Assignments",
    operation_id = "listAssignments",
    summary = "List assignments",
    description = "Returns assignments ordered by due date, optionally filtered by professor, subject or type.",
    params(AssignmentListQuery),
    responses(
        (status = 200, description = "List of assignments", body = AssignmentListResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, _auth_user))]
pub async fn list_assignments(
    _auth_user: AuthUser,
    State(state): State<AppState>,
    Query(query): Query<AssignmentListQuery>,
) -> Result<Json<AssignmentListResponse>, AppError> {
    let mut select = assignment::Entity::find();
    if let Some(professor_id) = query.professor_id {
        select = select.filter(assignment::Column::ProfessorId.eq(professor_id));
    }
    if let Some(subject_id) = query.subject_id {
        select = select.filter(assignment::Column::SubjectId.eq(subject_id));
    }
    if let Some(assignment_type) = query.assignment_type {
        select = select.filter(assignment::Column::AssignmentType.eq(assignment_type));
    }

    let rows = select
        .order_by_asc(assignment::Column::DueDate)
        .order_by_asc(assignment::Column::Id)
        .all(&state.db)
        .await?;

    Ok(Json(AssignmentListResponse {
        data: rows.into_iter().map(Into::into).collect(),
    }))
}

#[utoipa::path(
    get,
    path = "/{id}",
    tag = "Assignments",
    operation_id = "getAssignment",
    summary = "Get an assignment by ID",
    params(("id" = i32, Path, description = "Assignment ID")),
    responses(
        (status = 200, description = "Assignment", body = AssignmentResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Assignment not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, _auth_user), fields(id))]
pub async fn get_assignment(
    _auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<AssignmentResponse>, AppError> {
    Ok(Json(find_assignment(&state.db, id).await?.into()))
}

#[utoipa::path(
    delete,
    path = "/{id}",
    tag = "Assignments",
    operation_id = "deleteAssignment",
    summary = "Delete an assignment",
    description = "Deletes the assignment with all its submissions. Professors may only delete their own. Requires `assignment:create` permission.",
    params(("id" = i32, Path, description = "Assignment ID")),
    responses(
        (status = 204, description = "Assignment deleted"),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Assignment not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(id))]
pub async fn delete_assignment(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, AppError> {
    auth_user.require_permission(ASSIGNMENT_CREATE)?;

    let txn = state.db.begin().await?;
    let existing = assignment::Entity::find_by_id(id)
        .lock(LockType::Update)
        .one(&txn)
        .await?
        .ok_or_else(|| AppError::NotFound("Assignment not found".into()))?;
    ensure_owner(&auth_user, &existing)?;

    let removed =
        cascade::delete_assignments(&txn, Condition::all().add(assignment::Column::Id.eq(id)))
            .await?;
    txn.commit().await?;

    tracing::info!(
        assignment_id = id,
        submissions = removed.submissions,
        "Assignment deleted"
    );
    release_documents(&state.db, &*state.documents, removed.document_keys).await;

    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    put,
    path = "/{id}/document",
    tag = "Assignments",
    operation_id = "uploadAssignmentDocument",
    summary = "Attach the assignment brief",
    description = "Uploads the `file` multipart field as the assignment's document, replacing any previous one. Requires `assignment:create` permission.",
    params(("id" = i32, Path, description = "Assignment ID")),
    request_body(content_type = "multipart/form-data", description = "Document upload"),
    responses(
        (status = 200, description = "Document attached", body = AssignmentResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Assignment not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, multipart), fields(id))]
pub async fn upload_document(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    mut multipart: Multipart,
) -> Result<Json<AssignmentResponse>, AppError> {
    auth_user.require_permission(ASSIGNMENT_CREATE)?;
    ensure_owner(&auth_user, &find_assignment(&state.db, id).await?)?;

    let upload = read_upload(&mut multipart, state.config.storage.max_upload_size).await?;
    let key = state.documents.put(&upload.bytes).await?;

    let txn = state.db.begin().await?;
    let existing = assignment::Entity::find_by_id(id)
        .lock(LockType::Update)
        .one(&txn)
        .await?
        .ok_or_else(|| AppError::NotFound("Assignment not found".into()))?;
    let previous = existing.document_key.clone();

    let mut active: assignment::ActiveModel = existing.into();
    active.document_key = Set(Some(key.to_string()));
    active.document_name = Set(Some(upload.file_name));
    let model = active.update(&txn).await?;
    txn.commit().await?;

    tracing::info!(assignment_id = id, key = %key, "Assignment document attached");
    if let Some(previous) = previous.filter(|p| *p != key.to_string()) {
        release_documents(&state.db, &*state.documents, vec![previous]).await;
    }

    Ok(Json(model.into()))
}

#[utoipa::path(
    get,
    path = "/{id}/document",
    tag = "Assignments",
    operation_id = "downloadAssignmentDocument",
    summary = "Download the assignment brief",
    params(("id" = i32, Path, description = "Assignment ID")),
    responses(
        (status = 200, description = "Document content", content_type = "application/octet-stream"),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Assignment or document not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, _auth_user), fields(id))]
pub async fn download_document(
    _auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Response, AppError> {
    let assignment = find_assignment(&state.db, id).await?;
    let (Some(key), Some(name)) = (assignment.document_key, assignment.document_name) else {
        return Err(AppError::NotFound("Assignment has no document".into()));
    };
    download_response(&*state.documents, &key, &name).await
}

#[utoipa::path(
    get,
    path = "/me",
    tag = "Assignments",
    operation_id = "listMyAssignments",
    summary = "List my assignments",
    description = "Every assignment with the calling student's effective status for today. Overdue assignments without a hand-in show as `Missed`.",
    responses(
        (status = 200, description = "Assignments with statuses", body = MyAssignmentListResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Not a student (PERMISSION_DENIED)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(student_id = auth_user.user_id))]
pub async fn my_assignments(
    auth_user: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<MyAssignmentListResponse>, AppError> {
    let student_id = auth_user.require_student()?;

    let assignments = assignment::Entity::find()
        .order_by_asc(assignment::Column::DueDate)
        .order_by_asc(assignment::Column::Id)
        .all(&state.db)
        .await?;
    let mut submissions: HashMap<i32, assignment_submission::Model> =
        assignment_submission::Entity::find()
            .filter(assignment_submission::Column::StudentId.eq(student_id))
            .all(&state.db)
            .await?
            .into_iter()
            .map(|s| (s.assignment_id, s))
            .collect();

    let today = today();
    let data = assignments
        .into_iter()
        .map(|a| {
            let submission = submissions.remove(&a.id);
            let stored = submission.as_ref().map(|s| s.status).unwrap_or_default();
            let has_file = submission.as_ref().is_some_and(|s| s.file_key.is_some());
            MyAssignmentItem {
                status: stored.effective(a.due_date, has_file, today),
                file_name: submission.as_ref().and_then(|s| s.file_name.clone()),
                submitted_at: submission.and_then(|s| s.submitted_at),
                assignment: a.into(),
            }
        })
        .collect();

    Ok(Json(MyAssignmentListResponse { data }))
}

#[utoipa::path(
    put,
    path = "/{id}/submission",
    tag = "Assignments",
    operation_id = "submitAssignment",
    summary = "Upload my submission",
    description = "Uploads the `file` multipart field as the calling student's submission for an online assignment and marks it `Submitted`. A later upload replaces the file. Requires `assignment:submit` permission.",
    params(("id" = i32, Path, description = "Assignment ID")),
    request_body(content_type = "multipart/form-data", description = "Submission upload"),
    responses(
        (status = 200, description = "Submission stored", body = SubmissionResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Assignment not found (NOT_FOUND)", body = ErrorBody),
        (status = 409, description = "Submission already completed (CONFLICT)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, multipart), fields(id, student_id = auth_user.user_id))]
pub async fn submit_assignment(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    mut multipart: Multipart,
) -> Result<Json<SubmissionResponse>, AppError> {
    auth_user.require_permission(ASSIGNMENT_SUBMIT)?;
    let student_id = auth_user.require_student()?;

    let assignment = find_assignment(&state.db, id).await?;
    if assignment.assignment_type == AssignmentType::Offline {
        return Err(AppError::Validation(
            "Offline assignments are handed in on paper".into(),
        ));
    }

    let upload = read_upload(&mut multipart, state.config.storage.max_upload_size).await?;
    let key = state.documents.put(&upload.bytes).await?;
    let now = Utc::now();

    let txn = state.db.begin().await?;
    let existing = assignment_submission::Entity::find()
        .filter(assignment_submission::Column::AssignmentId.eq(id))
        .filter(assignment_submission::Column::StudentId.eq(student_id))
        .lock(LockType::Update)
        .one(&txn)
        .await?;

    let (model, previous) = match existing {
        Some(row) if row.status == SubmissionStatus::Completed => {
            txn.rollback().await?;
            release_documents(&state.db, &*state.documents, vec![key.to_string()]).await;
            return Err(AppError::Conflict(
                "Submission is already completed".into(),
            ));
        }
        Some(row) => {
            let previous = row.file_key.clone();
            let mut active: assignment_submission::ActiveModel = row.into();
            active.status = Set(SubmissionStatus::Submitted);
            active.file_key = Set(Some(key.to_string()));
            active.file_name = Set(Some(upload.file_name));
            active.submitted_at = Set(Some(now));
            active.updated_at = Set(now);
            (active.update(&txn).await?, previous)
        }
        None => {
            let model = assignment_submission::ActiveModel {
                assignment_id: Set(id),
                student_id: Set(student_id),
                status: Set(SubmissionStatus::Submitted),
                file_key: Set(Some(key.to_string())),
                file_name: Set(Some(upload.file_name)),
                submitted_at: Set(Some(now)),
                updated_at: Set(now),
                ..Default::default()
            }
            .insert(&txn)
            .await?;
            (model, None)
        }
    };
    txn.commit().await?;

    tracing::info!(assignment_id = id, student_id, key = %key, "Submission uploaded");
    if let Some(previous) = previous.filter(|p| *p != key.to_string()) {
        release_documents(&state.db, &*state.documents, vec![previous]).await;
    }

    Ok(Json(model.into()))
}

#[utoipa::path(
    get,
    path = "/{id}/submissions",
    tag = "Assignments",
    operation_id = "listSubmissions",
    summary = "Get an assignment's submission roster",
    description = "One row per student, ordered by roll, with the effective status for today. Requires `submission:view_all` or `submission:mark_offline` permission.",
    params(("id" = i32, Path, description = "Assignment ID")),
    responses(
        (status = 200, description = "Roster", body = SubmissionRosterResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Assignment not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(id))]
pub async fn list_submissions(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<SubmissionRosterResponse>, AppError> {
    auth_user.require_any_permission(&[SUBMISSION_VIEW_ALL, SUBMISSION_MARK_OFFLINE])?;
    let assignment = find_assignment(&state.db, id).await?;

    let students = student::Entity::find()
        .order_by_asc(student::Column::Roll)
        .all(&state.db)
        .await?;
    let mut submissions: HashMap<i32, assignment_submission::Model> =
        assignment_submission::Entity::find()
            .filter(assignment_submission::Column::AssignmentId.eq(id))
            .all(&state.db)
            .await?
            .into_iter()
            .map(|s| (s.student_id, s))
            .collect();

    let today = today();
    let rows = students
        .into_iter()
        .map(|st| {
            let submission = submissions.remove(&st.id);
            let stored = submission.as_ref().map(|s| s.status).unwrap_or_default();
            let has_file = submission.as_ref().is_some_and(|s| s.file_key.is_some());
            SubmissionRosterItem {
                student_id: st.id,
                roll: st.roll,
                name: st.name,
                group: st.group_tag,
                status: stored.effective(assignment.due_date, has_file, today),
                file_name: submission.as_ref().and_then(|s| s.file_name.clone()),
                submitted_at: submission.and_then(|s| s.submitted_at),
            }
        })
        .collect();

    Ok(Json(SubmissionRosterResponse {
        assignment: assignment.into(),
        submissions: rows,
    }))
}

#[utoipa::path(
    put,
    path = "/{id}/submissions",
    tag = "Assignments",
    operation_id = "markSubmissions",
    summary = "Set submission statuses",
    description = "Upserts the status of each listed student's submission. Requires `submission:mark`, or `submission:mark_offline` for offline assignments.",
    params(("id" = i32, Path, description = "Assignment ID")),
    request_body = MarkSubmissionsRequest,
    responses(
        (status = 200, description = "Updated submissions", body = MarkSubmissionsResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Assignment or student not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(id, count = payload.statuses.len()))]
pub async fn mark_submissions(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    AppJson(payload): AppJson<MarkSubmissionsRequest>,
) -> Result<Json<MarkSubmissionsResponse>, AppError> {
    let assignment = find_assignment(&state.db, id).await?;
    if !auth_user.has_permission(SUBMISSION_MARK) {
        auth_user.require_permission(SUBMISSION_MARK_OFFLINE)?;
        if assignment.assignment_type != AssignmentType::Offline {
            return Err(AppError::PermissionDenied);
        }
    }
    validate_mark_submissions(&payload)?;

    let ids: Vec<i32> = payload.statuses.iter().map(|s| s.student_id).collect();
    let known = student::Entity::find()
        .filter(student::Column::Id.is_in(ids.clone()))
        .count(&state.db)
        .await?;
    if known != ids.len() as u64 {
        return Err(AppError::NotFound("One or more students not found".into()));
    }

    let now = Utc::now();
    let rows = payload
        .statuses
        .iter()
        .map(|mark| assignment_submission::ActiveModel {
            assignment_id: Set(id),
            student_id: Set(mark.student_id),
            status: Set(mark.status),
            file_key: Set(None),
            file_name: Set(None),
            submitted_at: Set(mark.status.is_done().then_some(now)),
            updated_at: Set(now),
            ..Default::default()
        });

    let txn = state.db.begin().await?;
    assignment_submission::Entity::insert_many(rows)
        .on_conflict(
            OnConflict::columns([
                assignment_submission::Column::AssignmentId,
                assignment_submission::Column::StudentId,
            ])
            .update_columns([
                assignment_submission::Column::Status,
                assignment_submission::Column::UpdatedAt,
            ])
            .to_owned(),
        )
        .exec_without_returning(&txn)
        .await?;
    let updated = assignment_submission::Entity::find()
        .filter(assignment_submission::Column::AssignmentId.eq(id))
        .filter(assignment_submission::Column::StudentId.is_in(ids))
        .order_by_asc(assignment_submission::Column::StudentId)
        .all(&txn)
        .await?;
    txn.commit().await?;

    tracing::info!(assignment_id = id, marked = updated.len(), "Submission statuses set");
    Ok(Json(MarkSubmissionsResponse {
        data: updated.into_iter().map(Into::into).collect(),
    }))
}

#[utoipa::path(
    get,
    path = "/{id}/submissions/{student_id}/file",
    tag = "Assignments",
    operation_id = "downloadSubmission",
    summary = "Download a submission file",
    description = "Students may download their own file; others need `submission:view_all`.",
    params(
        ("id" = i32, Path, description = "Assignment ID"),
        ("student_id" = i32, Path, description = "Student ID"),
    ),
    responses(
        (status = 200, description = "File content", content_type = "application/octet-stream"),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Submission or file not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(id, student_id))]
pub async fn download_submission(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path((id, student_id)): Path<(i32, i32)>,
) -> Result<Response, AppError> {
    if auth_user.require_student().ok() != Some(student_id) {
        auth_user.require_permission(SUBMISSION_VIEW_ALL)?;
    }
    find_student(&state.db, student_id).await?;

    let submission = assignment_submission::Entity::find()
        .filter(assignment_submission::Column::AssignmentId.eq(id))
        .filter(assignment_submission::Column::StudentId.eq(student_id))
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Submission not found".into()))?;
    let (Some(key), Some(name)) = (submission.file_key, submission.file_name) else {
        return Err(AppError::NotFound("Submission has no file".into()));
    };
    download_response(&*state.documents, &key, &name).await
}
