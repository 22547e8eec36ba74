use serde_json::json;

use crate::common::{TestApp, routes};

/// Mark `count` consecutive March 2024 days of `subject`, with the CR present
/// on the first `present` of them.
async fn mark_days(
    app: &TestApp,
    cr_token: &str,
    cr_id: i32,
    subject: i32,
    professor: i32,
    count: u32,
    present: u32,
) {
    for day in 1..=count {
        let ids = if day <= present { vec![cr_id] } else { vec![] };
        let res = app
            .mark(cr_token, subject, professor, &format!("2024-03-{day:02}"), "ALL", &ids)
            .await;
        assert_eq!(res.status, 201, "{}", res.text);
    }
}

mod student_report {
    use super::*;

    #[tokio::test]
    async fn seven_of_ten_sessions_is_seventy_percent() {
        let app = TestApp::spawn().await;
        let admin = app.admin_token().await;
        let cr = app.create_student(&admin, "IT2501", "A", true).await;
        let (prof, _) = app.create_professor(&admin, "P101", "Dr. Rao").await;
        let ds = app.create_subject(&admin, "Data Structures", "Theory").await;
        mark_days(&app, &cr.token, cr.id, ds, prof, 10, 7).await;

        let res = app.get_with_token(&routes::student_report(cr.id), &admin).await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["attendance"]["attended"], 7);
        assert_eq!(res.body["attendance"]["total"], 10);
        assert_eq!(res.body["attendance"]["percentage"], 70.0);
    }

    #[tokio::test]
    async fn subject_breakdown_only_lists_subjects_with_records() {
        let app = TestApp::spawn().await;
        let admin = app.admin_token().await;
        let cr = app.create_student(&admin, "IT2501", "A", true).await;
        let (prof, _) = app.create_professor(&admin, "P101", "Dr. Rao").await;
        let x = app.create_subject(&admin, "Networks", "Theory").await;
        app.create_subject(&admin, "Algorithms", "Theory").await;
        mark_days(&app, &cr.token, cr.id, x, prof, 3, 2).await;

        let res = app.get_with_token(&routes::student_report(cr.id), &admin).await;

        let breakdown = res.body["attendance_by_subject"].as_array().unwrap();
        assert_eq!(breakdown.len(), 1);
        assert_eq!(breakdown[0]["subject_id"], x);
        assert_eq!(breakdown[0]["subject_name"], "Networks");
        assert_eq!(breakdown[0]["present"], 2);
        assert_eq!(breakdown[0]["total"], 3);
        assert_eq!(breakdown[0]["percentage"], 66.7);
    }

    #[tokio::test]
    async fn student_without_records_reports_zero() {
        let app = TestApp::spawn().await;
        let admin = app.admin_token().await;
        let student = app.create_student(&admin, "IT2501", "A", false).await;

        let res = app.get_with_token(&routes::student_report(student.id), &admin).await;

        assert_eq!(res.status, 200);
        assert_eq!(res.body["attendance"]["total"], 0);
        assert_eq!(res.body["attendance"]["percentage"], 0.0);
        assert_eq!(res.body["attendance_by_subject"], json!([]));
        assert_eq!(res.body["assignments"]["percentage"], 0.0);
        assert_eq!(res.body["assignments_by_subject"], json!([]));
    }

    #[tokio::test]
    async fn practical_sessions_of_the_other_group_do_not_count() {
        let app = TestApp::spawn().await;
        let admin = app.admin_token().await;
        let cr = app.create_student(&admin, "IT2501", "A", true).await;
        let other = app.create_student(&admin, "IT2502", "B", false).await;
        let (prof, _) = app.create_professor(&admin, "P101", "Dr. Rao").await;
        let lab = app.create_subject(&admin, "OS Lab", "Practical").await;

        app.mark(&cr.token, lab, prof, "2024-03-01", "A", &[cr.id]).await;
        app.mark(&cr.token, lab, prof, "2024-03-02", "A", &[]).await;

        let res = app.get_with_token(&routes::student_report(other.id), &admin).await;
        assert_eq!(res.body["attendance"]["total"], 0);

        let res = app.get_with_token(&routes::student_report(cr.id), &admin).await;
        assert_eq!(res.body["attendance"]["total"], 2);
        assert_eq!(res.body["attendance"]["percentage"], 50.0);
    }

    #[tokio::test]
    async fn assignment_completion_counts_submitted_and_completed() {
        let app = TestApp::spawn().await;
        let admin = app.admin_token().await;
        let student = app.create_student(&admin, "IT2501", "A", false).await;
        let (_, prof_token) = app.create_professor(&admin, "P101", "Dr. Rao").await;
        let ds = app.create_subject(&admin, "Data Structures", "Theory").await;
        let os = app.create_subject(&admin, "Operating Systems", "Theory").await;
        let first = app
            .create_assignment(&prof_token, ds, "Lists", "2099-01-01", "Offline")
            .await;
        app.create_assignment(&prof_token, ds, "Trees", "2099-01-01", "Offline")
            .await;
        app.create_assignment(&prof_token, os, "Paging", "2099-01-01", "Offline")
            .await;

        let marked = app
            .put_with_token(
                &routes::assignment_submissions(first),
                &json!({"statuses": [{"student_id": student.id, "status": "Completed"}]}),
                &prof_token,
            )
            .await;
        assert_eq!(marked.status, 200, "{}", marked.text);

        let res = app
            .get_with_token(&routes::student_report(student.id), &prof_token)
            .await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["assignments"]["done"], 1);
        assert_eq!(res.body["assignments"]["total"], 3);
        assert_eq!(res.body["assignments"]["percentage"], 33.3);
        let by_subject = res.body["assignments_by_subject"].as_array().unwrap();
        assert_eq!(by_subject.len(), 2);
        assert_eq!(by_subject[0]["subject_name"], "Data Structures");
        assert_eq!(by_subject[0]["done"], 1);
        assert_eq!(by_subject[0]["total"], 2);
        assert_eq!(by_subject[1]["done"], 0);
    }

    #[tokio::test]
    async fn student_may_read_own_report_only() {
        let app = TestApp::spawn().await;
        let admin = app.admin_token().await;
        let me = app.create_student(&admin, "IT2501", "A", false).await;
        let other = app.create_student(&admin, "IT2502", "A", false).await;

        let own = app.get_with_token(&routes::student_report(me.id), &me.token).await;
        assert_eq!(own.status, 200);
        assert_eq!(own.body["student"]["roll"], "IT2501");

        let theirs = app
            .get_with_token(&routes::student_report(other.id), &me.token)
            .await;
        assert_eq!(theirs.status, 403);
    }

    #[tokio::test]
    async fn unknown_student_is_not_found() {
        let app = TestApp::spawn().await;
        let admin = app.admin_token().await;

        let res = app.get_with_token(&routes::student_report(9999), &admin).await;

        assert_eq!(res.status, 404);
    }
}

mod dashboard {
    use super::*;

    #[tokio::test]
    async fn student_sees_headline_numbers() {
        let app = TestApp::spawn().await;
        let admin = app.admin_token().await;
        let cr = app.create_student(&admin, "IT2501", "A", true).await;
        let (prof, prof_token) = app.create_professor(&admin, "P101", "Dr. Rao").await;
        let ds = app.create_subject(&admin, "Data Structures", "Theory").await;
        mark_days(&app, &cr.token, cr.id, ds, prof, 4, 3).await;
        app.create_assignment(&prof_token, ds, "Lists", "2099-01-01", "Offline")
            .await;

        let res = app.get_with_token(routes::MY_DASHBOARD, &cr.token).await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["student"]["id"], cr.id);
        assert_eq!(res.body["attendance"]["percentage"], 75.0);
        assert_eq!(res.body["assignments"]["done"], 0);
        assert_eq!(res.body["assignments"]["total"], 1);
    }

    #[tokio::test]
    async fn staff_have_no_dashboard() {
        let app = TestApp::spawn().await;
        let admin = app.admin_token().await;

        let res = app.get_with_token(routes::MY_DASHBOARD, &admin).await;

        assert_eq!(res.status, 403);
    }
}
