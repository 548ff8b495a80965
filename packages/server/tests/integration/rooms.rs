use std::collections::HashSet;

use futures::future::join_all;
use serde_json::json;

use crate::common::{TestApp, routes};

const CODE_ALPHABET: &str = "ABCDEFGHJKLMNPQRSTUVWXYZ23456789";

mod create {
    use super::*;

    #[tokio::test]
    async fn codes_are_six_unambiguous_characters() {
        let app = TestApp::spawn().await;
        let teacher = app.teacher("t@campus.test").await;

        let mut seen = HashSet::new();
        for i in 0..20 {
            let (_, code) = app.create_room(&teacher.token, &format!("Room {i}")).await;
            assert_eq!(code.len(), 6);
            assert!(code.chars().all(|c| CODE_ALPHABET.contains(c)), "{code}");
            seen.insert(code);
        }
        assert_eq!(seen.len(), 20);
    }

    #[tokio::test]
    async fn concurrent_creates_get_distinct_codes() {
        let app = TestApp::spawn().await;
        let teacher = app.teacher("t@campus.test").await;

        let titles: Vec<String> = (0..12).map(|i| format!("Parallel {i}")).collect();
        let rooms = join_all(titles.iter().map(|t| app.create_room(&teacher.token, t))).await;

        let ids: HashSet<i32> = rooms.iter().map(|(id, _)| *id).collect();
        let codes: HashSet<&str> = rooms.iter().map(|(_, code)| code.as_str()).collect();
        assert_eq!(ids.len(), 12);
        assert_eq!(codes.len(), 12);

        let res = app.get_with_token(routes::ROOMS, &teacher.token).await;
        assert_eq!(res.body.as_array().unwrap().len(), 12);
    }

    #[tokio::test]
    async fn owner_becomes_a_member() {
        let app = TestApp::spawn().await;
        let teacher = app.teacher("t@campus.test").await;
        let (room_id, _) = app.create_room(&teacher.token, "Networks").await;

        let res = app.get_with_token(&routes::room(room_id), &teacher.token).await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["owner_id"], teacher.id);
        let members = res.body["members"].as_array().unwrap();
        assert_eq!(members.len(), 1);
        assert_eq!(members[0]["user_id"], teacher.id);
    }

    #[tokio::test]
    async fn students_cannot_create_rooms() {
        let app = TestApp::spawn().await;
        let student = app.student("s@campus.test").await;

        let res = app
            .post_with_token(routes::ROOMS, &json!({"title": "Mine"}), &student.token)
            .await;

        assert_eq!(res.status, 403);
        assert_eq!(res.body["code"], "PERMISSION_DENIED");
    }

    #[tokio::test]
    async fn blank_title_is_rejected() {
        let app = TestApp::spawn().await;
        let teacher = app.teacher("t@campus.test").await;

        let res = app
            .post_with_token(routes::ROOMS, &json!({"title": "   "}), &teacher.token)
            .await;

        assert_eq!(res.status, 400);
    }
}

mod join {
    use super::*;

    #[tokio::test]
    async fn code_is_case_insensitive_and_join_is_idempotent() {
        let app = TestApp::spawn().await;
        let teacher = app.teacher("t@campus.test").await;
        let student = app.student("s@campus.test").await;
        let (room_id, code) = app.create_room(&teacher.token, "Compilers").await;

        let lower = format!("  {}  ", code.to_lowercase());
        app.join_room(&student.token, &lower).await;
        app.join_room(&student.token, &code).await;

        let res = app.get_with_token(&routes::room(room_id), &student.token).await;
        assert_eq!(res.status, 200);
        assert_eq!(res.body["members"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn unknown_code_is_not_found() {
        let app = TestApp::spawn().await;
        let student = app.student("s@campus.test").await;

        let res = app
            .post_with_token(routes::JOIN_ROOM, &json!({"code": "ZZZZZZ"}), &student.token)
            .await;

        assert_eq!(res.status, 404);
    }

    #[tokio::test]
    async fn unapproved_students_wait_for_approval() {
        let app = TestApp::spawn().await;
        let admin = app.admin().await;
        let teacher = app.teacher("t@campus.test").await;
        let pending = app.register("p@campus.test", "student").await;
        let (_, code) = app.create_room(&teacher.token, "Databases").await;

        let res = app
            .post_with_token(routes::JOIN_ROOM, &json!({"code": code}), &pending.token)
            .await;
        assert_eq!(res.status, 403);
        assert_eq!(res.body["code"], "APPROVAL_REQUIRED");

        app.post_with_token(&routes::approve(pending.id), &json!({}), &admin.token)
            .await;

        app.join_room(&pending.token, &code).await;
    }
}

mod access {
    use super::*;

    #[tokio::test]
    async fn list_shows_only_joined_rooms() {
        let app = TestApp::spawn().await;
        let teacher = app.teacher("t@campus.test").await;
        let student = app.student("s@campus.test").await;
        let (joined, code) = app.create_room(&teacher.token, "Joined").await;
        app.create_room(&teacher.token, "Other").await;
        app.join_room(&student.token, &code).await;

        let mine = app.get_with_token(routes::ROOMS, &student.token).await;
        let owned = app.get_with_token(routes::ROOMS, &teacher.token).await;

        assert_eq!(mine.status, 200);
        let mine = mine.body.as_array().unwrap();
        assert_eq!(mine.len(), 1);
        assert_eq!(mine[0]["id"], joined);
        assert_eq!(owned.body.as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn outsiders_cannot_view_but_admins_can() {
        let app = TestApp::spawn().await;
        let admin = app.admin().await;
        let teacher = app.teacher("t@campus.test").await;
        let outsider = app.student("o@campus.test").await;
        let (room_id, _) = app.create_room(&teacher.token, "Private").await;

        let res = app.get_with_token(&routes::room(room_id), &outsider.token).await;
        assert_eq!(res.status, 403);

        let res = app.get_with_token(&routes::room(room_id), &admin.token).await;
        assert_eq!(res.status, 200);
    }

    #[tokio::test]
    async fn only_the_owner_deletes() {
        let app = TestApp::spawn().await;
        let (teacher, student, room_id) = app.classroom().await;

        let res = app.delete_with_token(&routes::room(room_id), &student.token).await;
        assert_eq!(res.status, 403);

        let res = app.delete_with_token(&routes::room(room_id), &teacher.token).await;
        assert_eq!(res.status, 204);

        let res = app.get_with_token(&routes::room(room_id), &teacher.token).await;
        assert_eq!(res.status, 404);
        let mine = app.get_with_token(routes::ROOMS, &student.token).await;
        assert!(mine.body.as_array().unwrap().is_empty());
    }
}
