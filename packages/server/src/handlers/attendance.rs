use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use sea_orm::TransactionTrait;
use tracing::instrument;

use super::professor::find_professor;
use super::student::student_attendance;
use super::subject::find_subject;
use crate::attendance::{AttendanceLedger, MarkRequest, RecordEdit, SessionFilter, SessionKey};
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::AppJson;
use crate::models::attendance::*;
use crate::permissions::{ATTENDANCE_EDIT, ATTENDANCE_MARK, ATTENDANCE_VIEW_ALL};
use crate::state::AppState;

#[utoipa::path(
    post,
    path = "/sessions",
    tag = "Attendance",
    operation_id = "markAttendance",
    summary = "Mark attendance for a class meeting",
    description = "Resolves the session for (subject, professor, date, group), creating it if needed, and replaces its roster: one record per cohort student, present if listed. Re-marking the same key replaces the previous roster. Requires `attendance:mark` permission (class representatives).",
    request_body = MarkAttendanceRequest,
    responses(
        (status = 201, description = "Session created and marked", body = MarkAttendanceResponse),
        (status = 200, description = "Existing session re-marked", body = MarkAttendanceResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Subject or professor not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(
    skip(state, auth_user, payload),
    fields(subject_id = payload.subject_id, professor_id = payload.professor_id, date = %payload.date, group = %payload.group)
)]
pub async fn mark_attendance(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<MarkAttendanceRequest>,
) -> Result<impl IntoResponse, AppError> {
    auth_user.require_permission(ATTENDANCE_MARK)?;
    let cr_id = auth_user.require_student()?;
    validate_mark_request(&payload)?;

    let subject = find_subject(&state.db, payload.subject_id).await?;
    find_professor(&state.db, payload.professor_id).await?;

    let request = MarkRequest {
        key: SessionKey {
            subject_id: payload.subject_id,
            professor_id: payload.professor_id,
            date: payload.date,
            group: payload.group,
        },
        subject_type: payload.subject_type.unwrap_or(subject.subject_type),
        recorded_by: Some(cr_id),
        present: payload.present_student_ids,
    };

    let txn = state.db.begin().await?;
    let outcome = AttendanceLedger::new(&txn).mark(&request).await?;
    txn.commit().await?;

    tracing::info!(
        session_id = outcome.session.id,
        created = outcome.created,
        cohort = outcome.cohort_size,
        present = outcome.present_count,
        "Attendance marked"
    );

    let status = if outcome.created {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok((
        status,
        Json(MarkAttendanceResponse {
            absent_count: outcome.cohort_size - outcome.present_count,
            cohort_size: outcome.cohort_size,
            present_count: outcome.present_count,
            created: outcome.created,
            session: outcome.session.into(),
        }),
    ))
}

#[utoipa::path(
    get,
    path = "/sessions",
    tag = "Attendance",
    operation_id = "searchSessions",
    summary = "Search attendance sessions",
    description = "Filters sessions by professor, subject, date, subject type and group. Results are ordered by group qualifier, then newest date first. Requires `attendance:view_all` permission.",
    params(SessionSearchQuery),
    responses(
        (status = 200, description = "Matching sessions with present/total counts", body = SessionListResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user))]
pub async fn search_sessions(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Query(query): Query<SessionSearchQuery>,
) -> Result<Json<SessionListResponse>, AppError> {
    auth_user.require_permission(ATTENDANCE_VIEW_ALL)?;

    let filter = SessionFilter {
        professor_id: query.professor_id,
        subject_id: query.subject_id,
        date: query.date,
        subject_type: query.subject_type,
        group: query.group,
    };
    let rows = AttendanceLedger::new(&state.db)
        .search_sessions(&filter)
        .await?;

    Ok(Json(SessionListResponse {
        data: rows.into_iter().map(Into::into).collect(),
    }))
}

#[utoipa::path(
    get,
    path = "/sessions/{id}",
    tag = "Attendance",
    operation_id = "getSession",
    summary = "Get a session with its records",
    description = "Returns the session and its records in roll-call order. Requires `attendance:view_all` or `attendance:mark` permission.",
    params(("id" = i32, Path, description = "Session ID")),
    responses(
        (status = 200, description = "Session report", body = SessionDetailResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Session not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(id))]
pub async fn get_session(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<SessionDetailResponse>, AppError> {
    auth_user.require_any_permission(&[ATTENDANCE_VIEW_ALL, ATTENDANCE_MARK])?;

    let ledger = AttendanceLedger::new(&state.db);
    let session = ledger.find_session(id).await?;
    let rows = ledger.session_report(id).await?;
    Ok(Json(SessionDetailResponse::new(session, rows)))
}

#[utoipa::path(
    patch,
    path = "/sessions/{id}/records",
    tag = "Attendance",
    operation_id = "editSessionRecords",
    summary = "Correct attendance records",
    description = "Sets presence (and optionally the note) of records in one session. All edits apply or none do. Requires `attendance:edit` permission.",
    params(("id" = i32, Path, description = "Session ID")),
    request_body = EditRecordsRequest,
    responses(
        (status = 200, description = "Updated session report", body = SessionDetailResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Session or record not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(id, records = payload.records.len()))]
pub async fn edit_records(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    AppJson(payload): AppJson<EditRecordsRequest>,
) -> Result<Json<SessionDetailResponse>, AppError> {
    auth_user.require_permission(ATTENDANCE_EDIT)?;
    validate_edit_records(&payload)?;

    let edits: Vec<RecordEdit> = payload
        .records
        .into_iter()
        .map(|item| RecordEdit {
            record_id: item.record_id,
            present: item.present,
            note: item.note.map(|note| note.map(|n| n.trim().to_string())),
        })
        .collect();

    let txn = state.db.begin().await?;
    let ledger = AttendanceLedger::new(&txn);
    let rows = ledger.edit_records(id, &edits).await?;
    let session = ledger.find_session(id).await?;
    txn.commit().await?;

    tracing::info!(session_id = id, edited = edits.len(), "Attendance records edited");
    Ok(Json(SessionDetailResponse::new(session, rows)))
}

#[utoipa::path(
    get,
    path = "/me",
    tag = "Attendance",
    operation_id = "getMyAttendance",
    summary = "Get my attendance",
    description = "The calling student's attendance rows, newest first, with the overall percentage.",
    responses(
        (status = 200, description = "Attendance rows", body = StudentAttendanceResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Not a student (PERMISSION_DENIED)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(student_id = auth_user.user_id))]
pub async fn my_attendance(
    auth_user: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<StudentAttendanceResponse>, AppError> {
    let student_id = auth_user.require_student()?;
    Ok(Json(student_attendance(&state.db, student_id).await?))
}
