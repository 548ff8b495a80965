use serde_json::json;

use crate::common::{TestApp, routes};

mod uploads {
    use super::*;

    #[tokio::test]
    async fn uploaded_file_downloads_with_etag() {
        let app = TestApp::spawn().await;
        let student = app.student("s@campus.test").await;
        let bytes = b"lecture notes".to_vec();

        let res = app
            .upload_with_token(routes::UPLOADS, "notes.txt", bytes.clone(), &student.token)
            .await;
        assert_eq!(res.status, 201, "{}", res.text);
        assert_eq!(res.body["file_name"], "notes.txt");
        assert_eq!(res.body["size"], bytes.len());
        let url = res.body["file_url"].as_str().unwrap().to_string();

        let download = app.client.get(app.url(&url)).send().await.unwrap();
        assert_eq!(download.status(), 200);
        let etag = download
            .headers()
            .get("etag")
            .expect("download should carry an ETag")
            .to_str()
            .unwrap()
            .to_string();
        assert!(
            download.headers()["content-disposition"]
                .to_str()
                .unwrap()
                .contains("notes.txt")
        );
        assert_eq!(download.bytes().await.unwrap().as_ref(), bytes.as_slice());

        let cached = app
            .client
            .get(app.url(&url))
            .header("If-None-Match", etag)
            .send()
            .await
            .unwrap();
        assert_eq!(cached.status(), 304);
    }

    #[tokio::test]
    async fn chat_upload_alias_stores_files_too() {
        let app = TestApp::spawn().await;
        let student = app.student("s@campus.test").await;

        let res = app
            .upload_with_token(routes::CHAT_UPLOAD, "photo.jpg", vec![0xff, 0xd8], &student.token)
            .await;

        assert_eq!(res.status, 201, "{}", res.text);
        assert_eq!(res.body["content_type"], "image/jpeg");
    }

    #[tokio::test]
    async fn upload_without_file_field_is_rejected() {
        let app = TestApp::spawn().await;
        let student = app.student("s@campus.test").await;
        let form = reqwest::multipart::Form::new().text("note", "no file here");

        let res = app
            .client
            .post(app.url(routes::UPLOADS))
            .header("Authorization", format!("Bearer {}", student.token))
            .multipart(form)
            .send()
            .await
            .unwrap();

        assert_eq!(res.status(), 400);
    }

    #[tokio::test]
    async fn unknown_file_is_not_found() {
        let app = TestApp::spawn().await;

        let missing = app
            .get_without_token("/api/v1/files/0190c2c4-9d5e-7a4e-8b1f-2f6a1c3d4e5f")
            .await;
        let malformed = app.get_without_token("/api/v1/files/not-a-uuid").await;

        assert_eq!(missing.status, 404);
        assert_eq!(malformed.status, 400);
    }
}

mod shared {
    use super::*;

    #[tokio::test]
    async fn members_share_files_and_links() {
        let app = TestApp::spawn().await;
        let (teacher, student, room_id) = app.classroom().await;

        let file = app
            .post_with_token(
                routes::RESOURCES,
                &json!({
                    "room_id": room_id,
                    "kind": "file",
                    "file_url": "/api/v1/files/0190c2c4-9d5e-7a4e-8b1f-2f6a1c3d4e5f",
                    "file_name": "syllabus.pdf"
                }),
                &teacher.token,
            )
            .await;
        assert_eq!(file.status, 201, "{}", file.text);
        assert_eq!(file.body["file_name"], "syllabus.pdf");

        let link = app
            .post_with_token(
                routes::RESOURCES,
                &json!({
                    "room_id": room_id,
                    "kind": "link",
                    "link_url": "https://example.org/visualgo",
                    "description": " Sorting visualizer "
                }),
                &student.token,
            )
            .await;
        assert_eq!(link.status, 201, "{}", link.text);
        assert_eq!(link.body["description"], "Sorting visualizer");

        let list = app.get_with_token(&routes::room_resources(room_id), &student.token).await;
        assert_eq!(list.status, 200);
        let items = list.body.as_array().unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0]["kind"], "link");
    }

    #[tokio::test]
    async fn link_without_url_is_rejected() {
        let app = TestApp::spawn().await;
        let (teacher, _, room_id) = app.classroom().await;

        let res = app
            .post_with_token(
                routes::RESOURCES,
                &json!({"room_id": room_id, "kind": "link"}),
                &teacher.token,
            )
            .await;

        assert_eq!(res.status, 400);
    }

    #[tokio::test]
    async fn outsiders_cannot_share() {
        let app = TestApp::spawn().await;
        let (_, _, room_id) = app.classroom().await;
        let outsider = app.student("o@campus.test").await;

        let res = app
            .post_with_token(
                routes::RESOURCES,
                &json!({"room_id": room_id, "kind": "link", "link_url": "https://example.org"}),
                &outsider.token,
            )
            .await;

        assert_eq!(res.status, 403);
    }

    #[tokio::test]
    async fn only_uploader_or_moderator_deletes() {
        let app = TestApp::spawn().await;
        let (teacher, student, room_id) = app.classroom().await;
        let other = app.student("other@campus.test").await;
        let code = app.get_with_token(&routes::room(room_id), &teacher.token).await.body["code"]
            .as_str()
            .unwrap()
            .to_string();
        app.join_room(&other.token, &code).await;

        let created = app
            .post_with_token(
                routes::RESOURCES,
                &json!({"room_id": room_id, "kind": "link", "link_url": "https://example.org"}),
                &student.token,
            )
            .await;
        let id = created.id();

        let res = app.delete_with_token(&routes::resource(id), &other.token).await;
        assert_eq!(res.status, 403);

        let res = app.delete_with_token(&routes::resource(id), &teacher.token).await;
        assert_eq!(res.status, 204);

        let res = app.delete_with_token(&routes::resource(id), &teacher.token).await;
        assert_eq!(res.status, 404);
    }
}
