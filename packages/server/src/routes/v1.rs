use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;

use crate::config::AppConfig;
use crate::documents::upload_body_limit;
use crate::handlers::{
    admin, announcement, assignment, attendance, auth, professor, report, student, subject,
};
use crate::state::AppState;

pub fn routes(config: &AppConfig) -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .nest("/auth", auth_routes())
        .nest("/students", student_routes())
        .nest("/professors", professor_routes())
        .nest("/subjects", subject_routes())
        .nest("/attendance", attendance_routes())
        .nest("/assignments", assignment_routes(config))
        .nest("/reports", report_routes())
        .nest("/announcements", announcement_routes(config))
        .nest("/admin", admin_routes())
}

fn auth_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(auth::login_student))
        .routes(routes!(auth::login_professor))
        .routes(routes!(auth::login_admin))
        .routes(routes!(auth::me))
}

fn student_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(student::list_students, student::create_student))
        .routes(routes!(
            student::get_student,
            student::update_student,
            student::delete_student
        ))
        .routes(routes!(student::get_student_attendance))
}

fn professor_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(professor::list_professors, professor::create_professor))
        .routes(routes!(
            professor::get_professor,
            professor::update_professor,
            professor::delete_professor
        ))
}

fn subject_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(subject::list_subjects, subject::create_subject))
        .routes(routes!(
            subject::get_subject,
            subject::update_subject,
            subject::delete_subject
        ))
}

fn attendance_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(attendance::mark_attendance, attendance::search_sessions))
        .routes(routes!(attendance::get_session))
        .routes(routes!(attendance::edit_records))
        .routes(routes!(attendance::my_attendance))
}

fn assignment_routes(config: &AppConfig) -> OpenApiRouter<AppState> {
    let crud = OpenApiRouter::new()
        .routes(routes!(
            assignment::list_assignments,
            assignment::create_assignment
        ))
        .routes(routes!(assignment::my_assignments))
        .routes(routes!(
            assignment::get_assignment,
            assignment::delete_assignment
        ))
        .routes(routes!(
            assignment::list_submissions,
            assignment::mark_submissions
        ))
        .routes(routes!(assignment::download_submission));

    let uploads = OpenApiRouter::new()
        .routes(routes!(
            assignment::upload_document,
            assignment::download_document
        ))
        .routes(routes!(assignment::submit_assignment))
        .layer(upload_body_limit(config.storage.max_upload_size));

    crud.merge(uploads)
}

fn report_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(report::my_dashboard))
        .routes(routes!(report::student_report))
}

fn announcement_routes(config: &AppConfig) -> OpenApiRouter<AppState> {
    let crud = OpenApiRouter::new()
        .routes(routes!(
            announcement::list_announcements,
            announcement::post_announcement
        ))
        .routes(routes!(announcement::delete_announcement));

    let uploads = OpenApiRouter::new()
        .routes(routes!(
            announcement::upload_announcement_document,
            announcement::download_announcement_document
        ))
        .layer(upload_body_limit(config.storage.max_upload_size));

    crud.merge(uploads)
}

fn admin_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new().routes(routes!(admin::purge))
}
