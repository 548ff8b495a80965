use serde_json::json;

use crate::common::{TestApp, routes};

mod departments {
    use super::*;

    #[tokio::test]
    async fn teacher_creates_department_with_uppercased_code() {
        let app = TestApp::spawn().await;
        let teacher = app.teacher("t@campus.test").await;

        let res = app
            .post_with_token(
                routes::DEPARTMENTS,
                &json!({"name": "Computer Science", "code": "cse"}),
                &teacher.token,
            )
            .await;

        assert_eq!(res.status, 201, "{}", res.text);
        assert_eq!(res.body["code"], "CSE");
        assert_eq!(res.body["description"], "");
    }

    #[tokio::test]
    async fn duplicate_code_conflicts() {
        let app = TestApp::spawn().await;
        let teacher = app.teacher("t@campus.test").await;
        let body = json!({"name": "Computer Science", "code": "CSE"});

        let first = app.post_with_token(routes::DEPARTMENTS, &body, &teacher.token).await;
        assert_eq!(first.status, 201);

        let res = app
            .post_with_token(
                routes::DEPARTMENTS,
                &json!({"name": "Other", "code": "cse"}),
                &teacher.token,
            )
            .await;
        assert_eq!(res.status, 409);
        assert_eq!(res.body["code"], "CONFLICT");
    }

    #[tokio::test]
    async fn students_read_but_cannot_write() {
        let app = TestApp::spawn().await;
        let teacher = app.teacher("t@campus.test").await;
        let student = app.register("s@campus.test", "student").await;
        app.post_with_token(
            routes::DEPARTMENTS,
            &json!({"name": "Mathematics", "code": "MAT"}),
            &teacher.token,
        )
        .await;

        let list = app.get_with_token(routes::DEPARTMENTS, &student.token).await;
        assert_eq!(list.status, 200);
        assert_eq!(list.body.as_array().unwrap().len(), 1);

        let res = app
            .post_with_token(
                routes::DEPARTMENTS,
                &json!({"name": "Physics", "code": "PHY"}),
                &student.token,
            )
            .await;
        assert_eq!(res.status, 403);
    }

    #[tokio::test]
    async fn update_then_delete() {
        let app = TestApp::spawn().await;
        let teacher = app.teacher("t@campus.test").await;
        let created = app
            .post_with_token(
                routes::DEPARTMENTS,
                &json!({"name": "Mathematics", "code": "MAT"}),
                &teacher.token,
            )
            .await;
        let id = created.id();

        let res = app
            .patch_with_token(
                &routes::department(id),
                &json!({"description": "Pure and applied"}),
                &teacher.token,
            )
            .await;
        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["description"], "Pure and applied");
        assert_eq!(res.body["code"], "MAT");

        let res = app.delete_with_token(&routes::department(id), &teacher.token).await;
        assert_eq!(res.status, 204);
        let res = app.delete_with_token(&routes::department(id), &teacher.token).await;
        assert_eq!(res.status, 404);
    }

    #[tokio::test]
    async fn non_alphanumeric_code_is_rejected() {
        let app = TestApp::spawn().await;
        let teacher = app.teacher("t@campus.test").await;

        let res = app
            .post_with_token(
                routes::DEPARTMENTS,
                &json!({"name": "Bad", "code": "C-S"}),
                &teacher.token,
            )
            .await;

        assert_eq!(res.status, 400);
    }
}

mod sections_and_intakes {
    use super::*;

    #[tokio::test]
    async fn section_label_is_limited_to_five_characters() {
        let app = TestApp::spawn().await;
        let teacher = app.teacher("t@campus.test").await;

        let ok = app
            .post_with_token(routes::SECTIONS, &json!({"section": "A1"}), &teacher.token)
            .await;
        let too_long = app
            .post_with_token(routes::SECTIONS, &json!({"section": "ABCDEF"}), &teacher.token)
            .await;

        assert_eq!(ok.status, 201, "{}", ok.text);
        assert_eq!(too_long.status, 400);
    }

    #[tokio::test]
    async fn intakes_are_unique_and_positive() {
        let app = TestApp::spawn().await;
        let teacher = app.teacher("t@campus.test").await;

        let first = app
            .post_with_token(routes::INTAKES, &json!({"intake": 51}), &teacher.token)
            .await;
        assert_eq!(first.status, 201, "{}", first.text);

        let dup = app
            .post_with_token(routes::INTAKES, &json!({"intake": 51}), &teacher.token)
            .await;
        assert_eq!(dup.status, 409);

        let zero = app
            .post_with_token(routes::INTAKES, &json!({"intake": 0}), &teacher.token)
            .await;
        assert_eq!(zero.status, 400);

        let renumbered = app
            .put_with_token(&routes::intake(first.id()), &json!({"intake": 52}), &teacher.token)
            .await;
        assert_eq!(renumbered.status, 200);
        assert_eq!(renumbered.body["intake"], 52);
    }
}

mod routines {
    use super::*;

    fn class(cohort: crate::common::Cohort, day: &str, period: &str) -> serde_json::Value {
        json!({
            "day": day,
            "time": period,
            "course_code": "cse331",
            "faculty_short_name": "FI",
            "building": 2,
            "room": 501,
            "intake_id": cohort.intake_id,
            "department_id": cohort.department_id,
            "section_id": cohort.section_id
        })
    }

    #[tokio::test]
    async fn a_period_holds_one_class_per_section() {
        let app = TestApp::spawn().await;
        let teacher = app.teacher("t@campus.test").await;
        let cohort = app.cohort(&teacher.token).await;

        let first = app
            .post_with_token(routes::ROUTINES, &class(cohort, "sun", "08:00AMto09:15AM"), &teacher.token)
            .await;
        assert_eq!(first.status, 201, "{}", first.text);
        assert_eq!(first.body["course_code"], "CSE331");
        assert_eq!(first.body["period"], "08:00AMto09:15AM");

        let clash = app
            .post_with_token(routes::ROUTINES, &class(cohort, "sun", "08:00AMto09:15AM"), &teacher.token)
            .await;
        assert_eq!(clash.status, 409);
        assert_eq!(clash.body["code"], "CONFLICT");

        let off_grid = app
            .post_with_token(routes::ROUTINES, &class(cohort, "sun", "08:00AMto09:00AM"), &teacher.token)
            .await;
        assert_eq!(off_grid.status, 400);
    }

    #[tokio::test]
    async fn routine_is_listed_in_week_order() {
        let app = TestApp::spawn().await;
        let teacher = app.teacher("t@campus.test").await;
        let cohort = app.cohort(&teacher.token).await;
        let student = app.register("s@campus.test", "student").await;

        for (day, period) in [
            ("mon", "09:15AMto10:30AM"),
            ("sat", "01:30PMto02:45PM"),
            ("mon", "08:00AMto09:15AM"),
        ] {
            let res = app
                .post_with_token(routes::ROUTINES, &class(cohort, day, period), &teacher.token)
                .await;
            assert_eq!(res.status, 201, "{}", res.text);
        }

        let res = app
            .get_with_token(
                &format!("{}?section_id={}", routes::ROUTINES, cohort.section_id),
                &student.token,
            )
            .await;
        assert_eq!(res.status, 200, "{}", res.text);
        let slots: Vec<(String, String)> = res
            .body
            .as_array()
            .unwrap()
            .iter()
            .map(|r| {
                (
                    r["day"].as_str().unwrap().to_string(),
                    r["period"].as_str().unwrap().to_string(),
                )
            })
            .collect();
        assert_eq!(
            slots,
            vec![
                ("sat".to_string(), "01:30PMto02:45PM".to_string()),
                ("mon".to_string(), "08:00AMto09:15AM".to_string()),
                ("mon".to_string(), "09:15AMto10:30AM".to_string()),
            ]
        );

        let res = app
            .post_with_token(routes::ROUTINES, &class(cohort, "tue", "08:00AMto09:15AM"), &student.token)
            .await;
        assert_eq!(res.status, 403);
    }

    #[tokio::test]
    async fn moving_a_class_onto_a_taken_period_conflicts() {
        let app = TestApp::spawn().await;
        let teacher = app.teacher("t@campus.test").await;
        let cohort = app.cohort(&teacher.token).await;

        app.post_with_token(routes::ROUTINES, &class(cohort, "sun", "08:00AMto09:15AM"), &teacher.token)
            .await;
        let second = app
            .post_with_token(routes::ROUTINES, &class(cohort, "sun", "09:15AMto10:30AM"), &teacher.token)
            .await;

        let res = app
            .patch_with_token(
                &routes::routine(second.id()),
                &json!({"period": "08:00AMto09:15AM"}),
                &teacher.token,
            )
            .await;
        assert_eq!(res.status, 409);

        let res = app
            .patch_with_token(&routes::routine(second.id()), &json!({"room": 502}), &teacher.token)
            .await;
        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["room"], 502);

        let res = app.delete_with_token(&routes::routine(second.id()), &teacher.token).await;
        assert_eq!(res.status, 204);
        let res = app.delete_with_token(&routes::routine(second.id()), &teacher.token).await;
        assert_eq!(res.status, 404);
    }
}
