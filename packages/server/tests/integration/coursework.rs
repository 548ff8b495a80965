use serde_json::{Value, json};

use crate::common::{Cohort, TestApp, routes};

fn coursework(cohort: Cohort, kind: &str, code: &str, due: Option<&str>) -> Value {
    json!({
        "type": kind,
        "course_code": code,
        "course_title": "Data Structures",
        "title": format!("{kind} for {code}"),
        "detail": "Submit through the portal",
        "due_date": due,
        "intake_id": cohort.intake_id,
        "department_id": cohort.department_id,
        "section_id": cohort.section_id
    })
}

#[tokio::test]
async fn teacher_announces_and_students_read() {
    let app = TestApp::spawn().await;
    let teacher = app.teacher("t@campus.test").await;
    let cohort = app.cohort(&teacher.token).await;
    let student = app.student("s@campus.test").await;

    let mut body = coursework(cohort, "lab_report", "CSE-231", Some("2030-01-10T00:00:00Z"));
    let created = app.post_with_token(routes::COURSEWORK, &body, &teacher.token).await;
    assert_eq!(created.status, 201, "{}", created.text);
    assert_eq!(created.body["type"], "lab_report");
    assert_eq!(created.body["created_by"], teacher.id);

    let read = app
        .get_with_token(&routes::coursework(created.id()), &student.token)
        .await;
    assert_eq!(read.status, 200);
    assert_eq!(read.body["title"], "lab_report for CSE-231");

    body["title"] = json!("By a student");
    let res = app.post_with_token(routes::COURSEWORK, &body, &student.token).await;
    assert_eq!(res.status, 403);
}

#[tokio::test]
async fn kind_defaults_to_assignment() {
    let app = TestApp::spawn().await;
    let teacher = app.teacher("t@campus.test").await;

    let res = app
        .post_with_token(
            routes::COURSEWORK,
            &json!({
                "course_code": "MAT-101",
                "course_title": "Calculus",
                "title": "Limits",
                "detail": "Exercises 1-10"
            }),
            &teacher.token,
        )
        .await;
    assert_eq!(res.status, 201, "{}", res.text);
    assert_eq!(res.body["type"], "assignment");
    assert!(res.body["section_id"].is_null());
}

#[tokio::test]
async fn invalid_coursework_is_rejected() {
    let app = TestApp::spawn().await;
    let teacher = app.teacher("t@campus.test").await;
    let cohort = app.cohort(&teacher.token).await;

    let long_code = coursework(cohort, "assignment", "CSE-23100", None);
    let res = app.post_with_token(routes::COURSEWORK, &long_code, &teacher.token).await;
    assert_eq!(res.status, 400);

    let mut blank = coursework(cohort, "assignment", "CSE-231", None);
    blank["detail"] = json!("   ");
    let res = app.post_with_token(routes::COURSEWORK, &blank, &teacher.token).await;
    assert_eq!(res.status, 400);

    let mut ghost = coursework(cohort, "assignment", "CSE-231", None);
    ghost["intake_id"] = json!(cohort.intake_id + 10);
    let res = app.post_with_token(routes::COURSEWORK, &ghost, &teacher.token).await;
    assert_eq!(res.status, 400);
}

#[tokio::test]
async fn list_filters_and_orders_by_due_date() {
    let app = TestApp::spawn().await;
    let teacher = app.teacher("t@campus.test").await;
    let cohort = app.cohort(&teacher.token).await;
    let student = app.student("s@campus.test").await;

    for body in [
        coursework(cohort, "assignment", "CSE-231", Some("2030-03-01T00:00:00Z")),
        coursework(cohort, "presentation", "CSE-231", Some("2030-02-01T00:00:00Z")),
        coursework(cohort, "assignment", "MAT-101", Some("2020-01-01T00:00:00Z")),
    ] {
        let res = app.post_with_token(routes::COURSEWORK, &body, &teacher.token).await;
        assert_eq!(res.status, 201, "{}", res.text);
    }

    let res = app
        .get_with_token(&format!("{}?course_code=cse", routes::COURSEWORK), &student.token)
        .await;
    assert_eq!(res.status, 200, "{}", res.text);
    assert_eq!(res.body["pagination"]["total"], 2);
    let data = res.body["data"].as_array().unwrap();
    assert_eq!(data[0]["type"], "presentation");
    assert_eq!(data[1]["type"], "assignment");

    let res = app
        .get_with_token(&format!("{}?upcoming=true", routes::COURSEWORK), &student.token)
        .await;
    assert_eq!(res.body["pagination"]["total"], 2);

    let res = app
        .get_with_token(&format!("{}?type=assignment", routes::COURSEWORK), &student.token)
        .await;
    assert_eq!(res.body["pagination"]["total"], 2);

    let pending = app.register("p@campus.test", "student").await;
    let res = app.get_with_token(routes::COURSEWORK, &pending.token).await;
    assert_eq!(res.status, 403);
    assert_eq!(res.body["code"], "APPROVAL_REQUIRED");
}

#[tokio::test]
async fn by_type_groups_a_cohort() {
    let app = TestApp::spawn().await;
    let teacher = app.teacher("t@campus.test").await;
    let cohort = app.cohort(&teacher.token).await;
    let student = app.student("s@campus.test").await;

    for kind in ["presentation", "assignment", "presentation"] {
        app.post_with_token(
            routes::COURSEWORK,
            &coursework(cohort, kind, "CSE-231", None),
            &teacher.token,
        )
        .await;
    }

    let res = app
        .get_with_token(
            &format!(
                "{}?intake_id={}&department_id={}&section_id={}",
                routes::COURSEWORK_BY_TYPE,
                cohort.intake_id,
                cohort.department_id,
                cohort.section_id
            ),
            &student.token,
        )
        .await;
    assert_eq!(res.status, 200, "{}", res.text);
    let groups = res.body.as_array().unwrap();
    assert_eq!(groups.len(), 2);
    assert_eq!(groups[0]["type"], "assignment");
    assert_eq!(groups[0]["count"], 1);
    assert_eq!(groups[1]["type"], "presentation");
    assert_eq!(groups[1]["count"], 2);

    let res = app
        .get_with_token(
            &format!("{}?intake_id={}", routes::COURSEWORK_BY_TYPE, cohort.intake_id),
            &student.token,
        )
        .await;
    assert_eq!(res.status, 400);
}

#[tokio::test]
async fn update_then_delete() {
    let app = TestApp::spawn().await;
    let teacher = app.teacher("t@campus.test").await;
    let cohort = app.cohort(&teacher.token).await;
    let student = app.student("s@campus.test").await;
    let id = app
        .post_with_token(
            routes::COURSEWORK,
            &coursework(cohort, "assignment", "CSE-231", None),
            &teacher.token,
        )
        .await
        .id();

    let res = app
        .put_with_token(
            &routes::coursework(id),
            &json!({"type": "presentation", "due_date": "2030-05-01T00:00:00Z"}),
            &teacher.token,
        )
        .await;
    assert_eq!(res.status, 200, "{}", res.text);
    assert_eq!(res.body["type"], "presentation");
    assert_eq!(res.body["course_code"], "CSE-231");

    let res = app.delete_with_token(&routes::coursework(id), &student.token).await;
    assert_eq!(res.status, 403);
    let res = app.delete_with_token(&routes::coursework(id), &teacher.token).await;
    assert_eq!(res.status, 204);
    let res = app.delete_with_token(&routes::coursework(id), &teacher.token).await;
    assert_eq!(res.status, 404);
}
