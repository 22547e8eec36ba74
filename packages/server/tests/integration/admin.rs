use serde_json::json;

use crate::common::{TestApp, routes};

mod purge {
    use super::*;

    #[tokio::test]
    async fn removes_academic_activity_and_keeps_people() {
        let app = TestApp::spawn().await;
        let admin = app.admin_token().await;
        let cr = app.create_student(&admin, "IT2501", "A", true).await;
        let other = app.create_student(&admin, "IT2502", "B", false).await;
        let (prof, prof_token) = app.create_professor(&admin, "P101", "Dr. Rao").await;
        let subject = app.create_subject(&admin, "Data Structures", "Theory").await;

        app.mark(&cr.token, subject, prof, "2024-03-01", "ALL", &[cr.id])
            .await;
        app.mark(&cr.token, subject, prof, "2024-03-02", "ALL", &[other.id])
            .await;
        let assignment = app
            .create_assignment(&prof_token, subject, "Lists", "2099-01-01", "Online")
            .await;
        app.upload_with_token(
            &routes::assignment_document(assignment),
            "brief.txt",
            b"brief".to_vec(),
            &prof_token,
        )
        .await;
        app.upload_with_token(
            &routes::assignment_submission(assignment),
            "answer.txt",
            b"answer".to_vec(),
            &other.token,
        )
        .await;
        let notice = app
            .post_with_token(
                routes::ANNOUNCEMENTS,
                &json!({"title": "Exam", "description": "Monday."}),
                &admin,
            )
            .await
            .id();
        app.upload_with_token(
            &routes::announcement_document(notice),
            "seating.txt",
            b"seating".to_vec(),
            &admin,
        )
        .await;
        assert_eq!(app.stored_document_count(), 3);

        let res = app.post_with_token(routes::PURGE, &json!({}), &admin).await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["attendance_sessions"], 2);
        assert_eq!(res.body["attendance_records"], 4);
        assert_eq!(res.body["assignments"], 1);
        assert_eq!(res.body["submissions"], 1);
        assert_eq!(res.body["announcements"], 1);
        assert_eq!(res.body["orphaned_documents"], 0);
        assert_eq!(app.stored_document_count(), 0);

        let sessions = app.get_with_token(routes::SESSIONS, &admin).await;
        assert_eq!(sessions.body["data"], json!([]));
        let assignments = app.get_with_token(routes::ASSIGNMENTS, &admin).await;
        assert_eq!(assignments.body["data"], json!([]));
        let announcements = app.get_with_token(routes::ANNOUNCEMENTS, &admin).await;
        assert_eq!(announcements.body["data"], json!([]));

        let students = app.get_with_token(routes::STUDENTS, &admin).await;
        assert_eq!(students.body["pagination"]["total"], 2);
        let professors = app.get_with_token(routes::PROFESSORS, &admin).await;
        assert_eq!(professors.body["data"].as_array().unwrap().len(), 1);
        let subjects = app.get_with_token(routes::SUBJECTS, &admin).await;
        assert_eq!(subjects.body["data"].as_array().unwrap().len(), 1);

        let report = app.get_with_token(&routes::student_report(cr.id), &admin).await;
        assert_eq!(report.body["attendance"]["total"], 0);
    }

    #[tokio::test]
    async fn purging_an_empty_system_succeeds() {
        let app = TestApp::spawn().await;
        let admin = app.admin_token().await;

        let res = app.post_with_token(routes::PURGE, &json!({}), &admin).await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["attendance_sessions"], 0);
        assert_eq!(res.body["announcements"], 0);
    }

    #[tokio::test]
    async fn requires_data_purge_permission() {
        let app = TestApp::spawn().await;
        let admin = app.admin_token().await;
        let (_, prof) = app.create_professor(&admin, "P101", "Dr. Rao").await;
        let cr = app.create_student(&admin, "IT2501", "A", true).await;

        let res = app.post_with_token(routes::PURGE, &json!({}), &prof).await;
        assert_eq!(res.status, 403);
        assert_eq!(res.body["code"], "PERMISSION_DENIED");

        let res = app.post_with_token(routes::PURGE, &json!({}), &cr.token).await;
        assert_eq!(res.status, 403);

        let res = app.post_without_token(routes::PURGE, &json!({})).await;
        assert_eq!(res.status, 401);
    }
}
