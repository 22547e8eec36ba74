use std::collections::HashMap;

use serde_json::{Value, json};

use crate::common::{TestApp, TestStudent, TestResponse, routes};

/// Admin token plus a DS theory subject, professor P101 and four students:
/// S1 (CR) and S2 in group A, S3 and S4 in group B.
struct Cohort {
    admin: String,
    professor: i32,
    students: Vec<TestStudent>,
}

impl Cohort {
    async fn new(app: &TestApp) -> Self {
        let admin = app.admin_token().await;
        let (professor, _) = app.create_professor(&admin, "P101", "Dr. Rao").await;
        let students = vec![
            app.create_student(&admin, "S1", "A", true).await,
            app.create_student(&admin, "S2", "A", false).await,
            app.create_student(&admin, "S3", "B", false).await,
            app.create_student(&admin, "S4", "B", false).await,
        ];
        Self {
            admin,
            professor,
            students,
        }
    }

    fn cr(&self) -> &str {
        &self.students[0].token
    }

    fn id(&self, n: usize) -> i32 {
        self.students[n - 1].id
    }
}

/// Presence of each student in a session report, keyed by student ID.
fn presence(detail: &TestResponse) -> HashMap<i32, bool> {
    detail.body["records"]
        .as_array()
        .expect("records should be an array")
        .iter()
        .map(|r| {
            (
                r["student_id"].as_i64().unwrap() as i32,
                r["present"].as_bool().unwrap(),
            )
        })
        .collect()
}

fn session_id(res: &TestResponse) -> i32 {
    res.body["session"]["id"].as_i64().unwrap() as i32
}

mod marking {
    use super::*;

    #[tokio::test]
    async fn theory_session_gets_a_record_for_every_student() {
        let app = TestApp::spawn().await;
        let c = Cohort::new(&app).await;
        let ds = app.create_subject(&c.admin, "DS", "Theory").await;

        let res = app
            .mark(c.cr(), ds, c.professor, "2024-03-01", "ALL", &[c.id(1), c.id(3)])
            .await;

        assert_eq!(res.status, 201, "{}", res.text);
        assert_eq!(res.body["created"], true);
        assert_eq!(res.body["cohort_size"], 4);
        assert_eq!(res.body["present_count"], 2);
        assert_eq!(res.body["absent_count"], 2);
        assert_eq!(res.body["session"]["subject_type"], "Theory");
        assert_eq!(res.body["session"]["recorded_by_cr_id"], c.id(1));

        let detail = app.get_with_token(&routes::session(session_id(&res)), &c.admin).await;
        let marks = presence(&detail);
        assert_eq!(marks.len(), 4);
        assert!(marks[&c.id(1)]);
        assert!(!marks[&c.id(2)]);
        assert!(marks[&c.id(3)]);
        assert!(!marks[&c.id(4)]);
        assert_eq!(detail.body["percentage"], 50.0);
    }

    #[tokio::test]
    async fn repeated_present_ids_count_once() {
        let app = TestApp::spawn().await;
        let c = Cohort::new(&app).await;
        let ds = app.create_subject(&c.admin, "DS", "Theory").await;

        let res = app
            .mark(c.cr(), ds, c.professor, "2024-03-01", "ALL", &[c.id(2), c.id(2), c.id(2)])
            .await;

        assert_eq!(res.status, 201, "{}", res.text);
        assert_eq!(res.body["present_count"], 1);
        assert_eq!(res.body["absent_count"], 3);
        let detail = app.get_with_token(&routes::session(session_id(&res)), &c.admin).await;
        let marks = presence(&detail);
        assert_eq!(marks.len(), 4);
        assert!(marks[&c.id(2)]);
        assert!(!marks[&c.id(1)]);
    }

    #[tokio::test]
    async fn re_marking_replaces_the_whole_roster() {
        let app = TestApp::spawn().await;
        let c = Cohort::new(&app).await;
        let ds = app.create_subject(&c.admin, "DS", "Theory").await;

        let first = app
            .mark(c.cr(), ds, c.professor, "2024-03-01", "ALL", &[c.id(1), c.id(3)])
            .await;
        let second = app
            .mark(c.cr(), ds, c.professor, "2024-03-01", "ALL", &[c.id(2)])
            .await;

        assert_eq!(second.status, 200, "{}", second.text);
        assert_eq!(second.body["created"], false);
        assert_eq!(session_id(&first), session_id(&second));

        let detail = app.get_with_token(&routes::session(session_id(&second)), &c.admin).await;
        let marks = presence(&detail);
        assert_eq!(marks.len(), 4);
        assert_eq!(
            marks.iter().filter(|(_, present)| **present).count(),
            1,
            "only the second roster may survive"
        );
        assert!(marks[&c.id(2)]);

        let sessions = app.get_with_token(routes::SESSIONS, &c.admin).await;
        assert_eq!(sessions.body["data"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn practical_group_session_only_covers_that_group() {
        let app = TestApp::spawn().await;
        let c = Cohort::new(&app).await;
        let lab = app.create_subject(&c.admin, "OS-Lab", "Practical").await;

        let res = app
            .mark(c.cr(), lab, c.professor, "2024-03-01", "A", &[c.id(1)])
            .await;
        assert_eq!(res.status, 201, "{}", res.text);
        assert_eq!(res.body["cohort_size"], 2);

        let detail = app.get_with_token(&routes::session(session_id(&res)), &c.admin).await;
        let marks = presence(&detail);
        assert_eq!(marks.len(), 2);
        assert!(!marks.contains_key(&c.id(3)));
        assert!(!marks.contains_key(&c.id(4)));

        let history = app
            .get_with_token(&routes::student_attendance(c.id(3)), &c.admin)
            .await;
        assert_eq!(history.body["records"], json!([]));
        assert_eq!(history.body["summary"]["percentage"], 0.0);
    }

    #[tokio::test]
    async fn group_on_a_theory_session_still_covers_everyone() {
        let app = TestApp::spawn().await;
        let c = Cohort::new(&app).await;
        let ds = app.create_subject(&c.admin, "DS", "Theory").await;

        let res = app
            .mark(c.cr(), ds, c.professor, "2024-03-01", "B", &[c.id(3)])
            .await;

        assert_eq!(res.status, 201, "{}", res.text);
        assert_eq!(res.body["cohort_size"], 4);
    }

    #[tokio::test]
    async fn groups_of_the_same_day_are_separate_sessions() {
        let app = TestApp::spawn().await;
        let c = Cohort::new(&app).await;
        let lab = app.create_subject(&c.admin, "OS-Lab", "Practical").await;

        let a = app
            .mark(c.cr(), lab, c.professor, "2024-03-01", "A", &[c.id(1)])
            .await;
        let b = app
            .mark(c.cr(), lab, c.professor, "2024-03-01", "B", &[c.id(4)])
            .await;

        assert_eq!(a.status, 201);
        assert_eq!(b.status, 201);
        assert_ne!(session_id(&a), session_id(&b));
    }

    #[tokio::test]
    async fn concurrent_markings_of_one_key_share_a_session() {
        let app = TestApp::spawn().await;
        let c = Cohort::new(&app).await;
        let ds = app.create_subject(&c.admin, "DS", "Theory").await;

        let present_first = [c.id(1)];
        let present_second = [c.id(2)];
        let (first, second) = tokio::join!(
            app.mark(c.cr(), ds, c.professor, "2024-03-01", "ALL", &present_first),
            app.mark(c.cr(), ds, c.professor, "2024-03-01", "ALL", &present_second),
        );

        assert!(first.status == 200 || first.status == 201, "{}", first.text);
        assert!(second.status == 200 || second.status == 201, "{}", second.text);
        assert_eq!(session_id(&first), session_id(&second));

        let detail = app.get_with_token(&routes::session(session_id(&first)), &c.admin).await;
        assert_eq!(detail.body["total"], 4);
        assert_eq!(detail.body["present"], 1);
    }

    #[tokio::test]
    async fn present_student_outside_the_cohort_is_rejected_without_writing() {
        let app = TestApp::spawn().await;
        let c = Cohort::new(&app).await;
        let lab = app.create_subject(&c.admin, "OS-Lab", "Practical").await;

        let res = app
            .mark(c.cr(), lab, c.professor, "2024-03-01", "A", &[c.id(1), c.id(3)])
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
        let sessions = app.get_with_token(routes::SESSIONS, &c.admin).await;
        assert_eq!(sessions.body["data"], json!([]));
    }

    #[tokio::test]
    async fn unknown_subject_is_not_found() {
        let app = TestApp::spawn().await;
        let c = Cohort::new(&app).await;

        let res = app
            .mark(c.cr(), 9999, c.professor, "2024-03-01", "ALL", &[])
            .await;

        assert_eq!(res.status, 404);
    }

    #[tokio::test]
    async fn only_class_representatives_may_mark() {
        let app = TestApp::spawn().await;
        let c = Cohort::new(&app).await;
        let ds = app.create_subject(&c.admin, "DS", "Theory").await;

        let student = app
            .mark(&c.students[1].token, ds, c.professor, "2024-03-01", "ALL", &[])
            .await;
        let admin = app
            .mark(&c.admin, ds, c.professor, "2024-03-01", "ALL", &[])
            .await;

        assert_eq!(student.status, 403);
        assert_eq!(admin.status, 403);
    }

    #[tokio::test]
    async fn explicit_subject_type_overrides_the_subject_default() {
        let app = TestApp::spawn().await;
        let c = Cohort::new(&app).await;
        let ds = app.create_subject(&c.admin, "DS", "Theory").await;

        let res = app
            .post_with_token(
                routes::SESSIONS,
                &json!({
                    "subject_id": ds,
                    "professor_id": c.professor,
                    "date": "2024-03-01",
                    "subject_type": "Practical",
                    "group": "A",
                    "present_student_ids": [c.id(1)],
                }),
                c.cr(),
            )
            .await;

        assert_eq!(res.status, 201, "{}", res.text);
        assert_eq!(res.body["session"]["subject_type"], "Practical");
        assert_eq!(res.body["cohort_size"], 2);
    }
}

mod searching {
    use super::*;

    #[tokio::test]
    async fn filters_by_subject_and_orders_by_group() {
        let app = TestApp::spawn().await;
        let c = Cohort::new(&app).await;
        let lab = app.create_subject(&c.admin, "OS-Lab", "Practical").await;
        let ds = app.create_subject(&c.admin, "DS", "Theory").await;

        app.mark(c.cr(), lab, c.professor, "2024-03-01", "B", &[]).await;
        app.mark(c.cr(), lab, c.professor, "2024-03-02", "A", &[c.id(1)])
            .await;
        app.mark(c.cr(), ds, c.professor, "2024-03-01", "ALL", &[]).await;

        let res = app
            .get_with_token(&format!("{}?subject_id={lab}", routes::SESSIONS), &c.admin)
            .await;

        assert_eq!(res.status, 200, "{}", res.text);
        let groups: Vec<&str> = res.body["data"]
            .as_array()
            .unwrap()
            .iter()
            .map(|s| s["group"].as_str().unwrap())
            .collect();
        assert_eq!(groups, vec!["A", "B"]);
        assert_eq!(res.body["data"][0]["present"], 1);
        assert_eq!(res.body["data"][0]["total"], 2);
    }

    #[tokio::test]
    async fn filters_by_date() {
        let app = TestApp::spawn().await;
        let c = Cohort::new(&app).await;
        let ds = app.create_subject(&c.admin, "DS", "Theory").await;
        app.mark(c.cr(), ds, c.professor, "2024-03-01", "ALL", &[]).await;
        app.mark(c.cr(), ds, c.professor, "2024-03-02", "ALL", &[]).await;

        let res = app
            .get_with_token(&format!("{}?date=2024-03-02", routes::SESSIONS), &c.admin)
            .await;

        let data = res.body["data"].as_array().unwrap();
        assert_eq!(data.len(), 1);
        assert_eq!(data[0]["date"], "2024-03-02");
    }

    #[tokio::test]
    async fn students_cannot_search_sessions() {
        let app = TestApp::spawn().await;
        let c = Cohort::new(&app).await;

        let res = app.get_with_token(routes::SESSIONS, &c.students[1].token).await;

        assert_eq!(res.status, 403);
    }
}

mod editing {
    use super::*;

    async fn marked_session(app: &TestApp, c: &Cohort) -> (i32, Value) {
        let ds = app.create_subject(&c.admin, "DS", "Theory").await;
        let res = app
            .mark(c.cr(), ds, c.professor, "2024-03-01", "ALL", &[c.id(1)])
            .await;
        let id = session_id(&res);
        let detail = app.get_with_token(&routes::session(id), &c.admin).await;
        (id, detail.body["records"].clone())
    }

    #[tokio::test]
    async fn admin_flips_presence_and_sets_a_note() {
        let app = TestApp::spawn().await;
        let c = Cohort::new(&app).await;
        let (id, records) = marked_session(&app, &c).await;
        let record_id = records[1]["record_id"].as_i64().unwrap();

        let res = app
            .patch_with_token(
                &routes::session_records(id),
                &json!({"records": [{"record_id": record_id, "present": true, "note": "late"}]}),
                &c.admin,
            )
            .await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["present"], 2);
        assert_eq!(res.body["records"][1]["present"], true);
        assert_eq!(res.body["records"][1]["note"], "late");
    }

    #[tokio::test]
    async fn foreign_record_id_fails_and_applies_nothing() {
        let app = TestApp::spawn().await;
        let c = Cohort::new(&app).await;
        let (id, records) = marked_session(&app, &c).await;
        let record_id = records[1]["record_id"].as_i64().unwrap();

        let res = app
            .patch_with_token(
                &routes::session_records(id),
                &json!({"records": [
                    {"record_id": record_id, "present": true},
                    {"record_id": 999_999, "present": true},
                ]}),
                &c.admin,
            )
            .await;

        assert_eq!(res.status, 404);
        let detail = app.get_with_token(&routes::session(id), &c.admin).await;
        assert_eq!(detail.body["records"][1]["present"], false);
    }

    #[tokio::test]
    async fn class_representative_cannot_edit_records() {
        let app = TestApp::spawn().await;
        let c = Cohort::new(&app).await;
        let (id, records) = marked_session(&app, &c).await;
        let record_id = records[0]["record_id"].as_i64().unwrap();

        let res = app
            .patch_with_token(
                &routes::session_records(id),
                &json!({"records": [{"record_id": record_id, "present": false}]}),
                c.cr(),
            )
            .await;

        assert_eq!(res.status, 403);
    }
}

mod history {
    use super::*;

    #[tokio::test]
    async fn student_sees_own_rows_newest_first() {
        let app = TestApp::spawn().await;
        let c = Cohort::new(&app).await;
        let ds = app.create_subject(&c.admin, "DS", "Theory").await;
        app.mark(c.cr(), ds, c.professor, "2024-03-01", "ALL", &[c.id(2)])
            .await;
        app.mark(c.cr(), ds, c.professor, "2024-03-04", "ALL", &[]).await;

        let res = app
            .get_with_token(routes::MY_ATTENDANCE, &c.students[1].token)
            .await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["student_id"], c.id(2));
        let records = res.body["records"].as_array().unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0]["date"], "2024-03-04");
        assert_eq!(records[0]["present"], false);
        assert_eq!(records[1]["subject_name"], "DS");
        assert_eq!(records[1]["professor_name"], "Dr. Rao");
        assert_eq!(res.body["summary"]["attended"], 1);
        assert_eq!(res.body["summary"]["percentage"], 50.0);
    }

    #[tokio::test]
    async fn staff_have_no_own_attendance() {
        let app = TestApp::spawn().await;
        let c = Cohort::new(&app).await;

        let res = app.get_with_token(routes::MY_ATTENDANCE, &c.admin).await;

        assert_eq!(res.status, 403);
    }
}
