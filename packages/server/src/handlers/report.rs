use axum::Json;
use axum::extract::{Path, State};
use tracing::instrument;

use super::student::find_student;
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::models::report::{DashboardResponse, StudentReportResponse};
use crate::permissions::REPORT_VIEW;
use crate::reporting::ReportService;
use crate::state::AppState;

#[utoipa::path(
    get,
    path = "/me",
    tag = "Reports",
    operation_id = "getMyDashboard",
    summary = "Get my dashboard",
    description = "Attendance and assignment completion totals for the calling student.",
    responses(
        (status = 200, description = "Dashboard", body = DashboardResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Not a student (PERMISSION_DENIED)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(student_id = auth_user.user_id))]
pub async fn my_dashboard(
    auth_user: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<DashboardResponse>, AppError> {
    let student_id = auth_user.require_student()?;
    let student = find_student(&state.db, student_id).await?;

    let reports = ReportService::new(&state.db);
    let attendance = reports.attendance_summary(student_id).await?;
    let assignments = reports.assignment_summary(student_id).await?;

    Ok(Json(DashboardResponse {
        student: student.into(),
        attendance: attendance.into(),
        assignments: assignments.into(),
    }))
}

#[utoipa::path(
    get,
    path = "/students/{id}",
    tag = "Reports",
    operation_id = "getStudentReport",
    summary = "Get a student's full report",
    description = "Attendance and assignment totals with per-subject breakdowns. Students may read their own; others need `report:view`.",
    params(("id" = i32, Path, description = "Student ID")),
    responses(
        (status = 200, description = "Report", body = StudentReportResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Student not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(id))]
pub async fn student_report(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<StudentReportResponse>, AppError> {
    if auth_user.require_student().ok() != Some(id) {
        auth_user.require_permission(REPORT_VIEW)?;
    }
    let student = find_student(&state.db, id).await?;
    let report = ReportService::new(&state.db).student_report(id).await?;
    Ok(Json(StudentReportResponse::new(student.into(), report)))
}
