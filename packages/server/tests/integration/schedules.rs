use serde_json::{Value, json};

use crate::common::{TestApp, routes};

fn schedule(title: &str, sections: &[i32], start: &str, end: &str) -> Value {
    json!({
        "title": title,
        "description": "Weekly lectures",
        "course_code": "CSE-231",
        "course_title": "Data Structures",
        "start_date": start,
        "end_date": end,
        "time_slots": [
            {"day": "sunday", "startTime": "08:00", "endTime": "09:15", "room": "501"},
            {"day": "tuesday", "start_time": "10:30", "end_time": "11:45"}
        ],
        "sections": sections
    })
}

#[tokio::test]
async fn teacher_creates_schedule_for_sections() {
    let app = TestApp::spawn().await;
    let teacher = app.teacher("t@campus.test").await;
    let cohort = app.cohort(&teacher.token).await;

    let res = app
        .post_with_token(
            routes::SCHEDULES,
            &schedule(
                "DS spring",
                &[cohort.section_id, cohort.section_id],
                "2026-02-01T00:00:00Z",
                "2026-06-01T00:00:00Z",
            ),
            &teacher.token,
        )
        .await;

    assert_eq!(res.status, 201, "{}", res.text);
    assert_eq!(res.body["teacher_id"], teacher.id);
    assert_eq!(res.body["created_by"], teacher.id);
    assert_eq!(res.body["sections"], json!([cohort.section_id]));
    assert_eq!(res.body["time_slots"][0]["start_time"], "08:00");
    assert_eq!(res.body["time_slots"][1]["room"], Value::Null);

    let fetched = app.get_with_token(&routes::schedule(res.id()), &teacher.token).await;
    assert_eq!(fetched.status, 200);
    assert_eq!(fetched.body["sections"], json!([cohort.section_id]));
}

#[tokio::test]
async fn invalid_schedules_are_rejected() {
    let app = TestApp::spawn().await;
    let teacher = app.teacher("t@campus.test").await;
    let cohort = app.cohort(&teacher.token).await;
    let student = app.student("s@campus.test").await;
    let ok = |title: &str| {
        schedule(
            title,
            &[cohort.section_id],
            "2026-02-01T00:00:00Z",
            "2026-06-01T00:00:00Z",
        )
    };

    let backwards = schedule(
        "Backwards",
        &[cohort.section_id],
        "2026-06-01T00:00:00Z",
        "2026-02-01T00:00:00Z",
    );
    let res = app.post_with_token(routes::SCHEDULES, &backwards, &teacher.token).await;
    assert_eq!(res.status, 400);

    let unknown_section = schedule(
        "Ghost section",
        &[cohort.section_id + 50],
        "2026-02-01T00:00:00Z",
        "2026-06-01T00:00:00Z",
    );
    let res = app
        .post_with_token(routes::SCHEDULES, &unknown_section, &teacher.token)
        .await;
    assert_eq!(res.status, 400);

    let mut taught_by_student = ok("Wrong teacher");
    taught_by_student["teacher_id"] = json!(student.id);
    let res = app
        .post_with_token(routes::SCHEDULES, &taught_by_student, &teacher.token)
        .await;
    assert_eq!(res.status, 400);

    let res = app
        .post_with_token(routes::SCHEDULES, &ok("By a student"), &student.token)
        .await;
    assert_eq!(res.status, 403);
}

#[tokio::test]
async fn only_the_creator_or_an_admin_edits() {
    let app = TestApp::spawn().await;
    let owner = app.teacher("owner@campus.test").await;
    let other = app.teacher("other@campus.test").await;
    let admin = app.admin().await;
    let cohort = app.cohort(&owner.token).await;
    let second_section = app
        .post_with_token(routes::SECTIONS, &json!({"section": "B"}), &owner.token)
        .await
        .id();
    let id = app
        .post_with_token(
            routes::SCHEDULES,
            &schedule(
                "DS",
                &[cohort.section_id],
                "2026-02-01T00:00:00Z",
                "2026-06-01T00:00:00Z",
            ),
            &owner.token,
        )
        .await
        .id();

    let res = app
        .put_with_token(&routes::schedule(id), &json!({"title": "Hijacked"}), &other.token)
        .await;
    assert_eq!(res.status, 403);

    let res = app
        .put_with_token(
            &routes::schedule(id),
            &json!({"title": "DS revised", "sections": [second_section]}),
            &owner.token,
        )
        .await;
    assert_eq!(res.status, 200, "{}", res.text);
    assert_eq!(res.body["title"], "DS revised");
    assert_eq!(res.body["sections"], json!([second_section]));

    let res = app
        .put_with_token(
            &routes::schedule(id),
            &json!({"end_date": "2026-01-01T00:00:00Z"}),
            &owner.token,
        )
        .await;
    assert_eq!(res.status, 400, "end before the stored start");

    let res = app.delete_with_token(&routes::schedule(id), &other.token).await;
    assert_eq!(res.status, 403);
    let res = app.delete_with_token(&routes::schedule(id), &admin.token).await;
    assert_eq!(res.status, 204);
    let res = app.get_with_token(&routes::schedule(id), &owner.token).await;
    assert_eq!(res.status, 404);
}

#[tokio::test]
async fn list_filters_by_section_and_requires_approval() {
    let app = TestApp::spawn().await;
    let teacher = app.teacher("t@campus.test").await;
    let cohort = app.cohort(&teacher.token).await;
    let other_section = app
        .post_with_token(routes::SECTIONS, &json!({"section": "B"}), &teacher.token)
        .await
        .id();
    for (title, section) in [("A only", cohort.section_id), ("B only", other_section)] {
        let res = app
            .post_with_token(
                routes::SCHEDULES,
                &schedule(title, &[section], "2026-02-01T00:00:00Z", "2026-06-01T00:00:00Z"),
                &teacher.token,
            )
            .await;
        assert_eq!(res.status, 201, "{}", res.text);
    }

    let pending = app.register("pending@campus.test", "student").await;
    let res = app.get_with_token(routes::SCHEDULES, &pending.token).await;
    assert_eq!(res.status, 403);
    assert_eq!(res.body["code"], "APPROVAL_REQUIRED");

    let student = app.student("s@campus.test").await;
    let all = app.get_with_token(routes::SCHEDULES, &student.token).await;
    assert_eq!(all.body["pagination"]["total"], 2);

    let res = app
        .get_with_token(
            &format!("{}?section_id={other_section}", routes::SCHEDULES),
            &student.token,
        )
        .await;
    let data = res.body["data"].as_array().unwrap();
    assert_eq!(data.len(), 1);
    assert_eq!(data[0]["title"], "B only");
}

#[tokio::test]
async fn calendar_returns_overlapping_schedules_in_start_order() {
    let app = TestApp::spawn().await;
    let teacher = app.teacher("t@campus.test").await;
    let cohort = app.cohort(&teacher.token).await;
    let s = [cohort.section_id];
    for body in [
        schedule("Summer", &s, "2026-06-01T00:00:00Z", "2026-08-31T00:00:00Z"),
        schedule("Spring", &s, "2026-02-01T00:00:00Z", "2026-05-31T00:00:00Z"),
        schedule("Autumn", &s, "2026-09-01T00:00:00Z", "2026-12-15T00:00:00Z"),
    ] {
        let res = app.post_with_token(routes::SCHEDULES, &body, &teacher.token).await;
        assert_eq!(res.status, 201, "{}", res.text);
    }

    let res = app
        .get_with_token(
            &format!(
                "{}?start=2026-05-15T00:00:00Z&end=2026-06-15T00:00:00Z",
                routes::CALENDAR
            ),
            &teacher.token,
        )
        .await;
    assert_eq!(res.status, 200, "{}", res.text);
    let titles: Vec<&str> = res
        .body
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s["title"].as_str().unwrap())
        .collect();
    assert_eq!(titles, vec!["Spring", "Summer"]);

    let res = app
        .get_with_token(
            &format!(
                "{}?start=2026-07-01T00:00:00Z&end=2026-06-01T00:00:00Z",
                routes::CALENDAR
            ),
            &teacher.token,
        )
        .await;
    assert_eq!(res.status, 400);
}
