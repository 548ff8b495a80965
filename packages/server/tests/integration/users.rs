use serde_json::json;

use crate::common::{TestApp, routes};

#[tokio::test]
async fn admin_lists_users_with_filters() {
    let app = TestApp::spawn().await;
    let admin = app.admin().await;
    app.register("s1@campus.test", "student").await;
    app.register("s2@campus.test", "student").await;
    app.teacher("t1@campus.test").await;

    let res = app
        .get_with_token(&format!("{}?role=student&per_page=1", routes::USERS), &admin.token)
        .await;

    assert_eq!(res.status, 200, "{}", res.text);
    assert_eq!(res.body["data"].as_array().unwrap().len(), 1);
    assert_eq!(res.body["pagination"]["total"], 2);
    assert_eq!(res.body["pagination"]["total_pages"], 2);

    let res = app
        .get_with_token(&format!("{}?search=T1%40", routes::USERS), &admin.token)
        .await;
    assert_eq!(res.body["data"][0]["email"], "t1@campus.test");
    assert_eq!(res.body["pagination"]["total"], 1);
}

#[tokio::test]
async fn students_cannot_list_users() {
    let app = TestApp::spawn().await;
    let student = app.register("s@campus.test", "student").await;

    let res = app.get_with_token(routes::USERS, &student.token).await;

    assert_eq!(res.status, 403);
    assert_eq!(res.body["code"], "PERMISSION_DENIED");
}

#[tokio::test]
async fn approval_is_idempotent() {
    let app = TestApp::spawn().await;
    let admin = app.admin().await;
    let student = app.register("s@campus.test", "student").await;

    for _ in 0..2 {
        let res = app
            .post_with_token(&routes::approve(student.id), &json!({}), &admin.token)
            .await;
        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["is_approved"], true);
    }

    let res = app
        .get_with_token(&format!("{}?is_approved=false", routes::USERS), &admin.token)
        .await;
    assert_eq!(res.body["pagination"]["total"], 0);
}

#[tokio::test]
async fn approving_unknown_user_is_not_found() {
    let app = TestApp::spawn().await;
    let admin = app.admin().await;

    let res = app
        .post_with_token(&routes::approve(9999), &json!({}), &admin.token)
        .await;

    assert_eq!(res.status, 404);
}

#[tokio::test]
async fn promotion_to_teacher_approves_the_account() {
    let app = TestApp::spawn().await;
    let admin = app.admin().await;
    let student = app.register("s@campus.test", "student").await;

    let res = app
        .patch_with_token(&routes::user(student.id), &json!({"role": "teacher"}), &admin.token)
        .await;

    assert_eq!(res.status, 200, "{}", res.text);
    assert_eq!(res.body["role"], "teacher");
    assert_eq!(res.body["is_approved"], true);
}

#[tokio::test]
async fn admin_cannot_deactivate_themselves() {
    let app = TestApp::spawn().await;
    let admin = app.admin().await;

    let res = app
        .patch_with_token(&routes::user(admin.id), &json!({"is_active": false}), &admin.token)
        .await;

    assert_eq!(res.status, 400);
    assert_eq!(res.body["code"], "VALIDATION_ERROR");
}
