use futures::future::join_all;
use serde_json::{Value, json};

use crate::common::{TestApp, routes};

async fn create_assignment(app: &TestApp, token: &str, body: Value) -> i32 {
    let res = app.post_with_token(routes::ASSIGNMENTS, &body, token).await;
    assert_eq!(res.status, 201, "create_assignment failed: {}", res.text);
    res.id()
}

async fn submit(app: &TestApp, token: &str, assignment_id: i32, answers: Value) -> Value {
    let res = app
        .post_with_token(
            routes::SUBMISSIONS,
            &json!({"assignment_id": assignment_id, "answers": answers}),
            token,
        )
        .await;
    assert_eq!(res.status, 200, "submit failed: {}", res.text);
    res.body
}

fn quiz(room_id: i32) -> Value {
    json!({
        "room_id": room_id,
        "title": "Arithmetic",
        "questions": [
            {"text": "2 + 2?", "correctAnswer": "4", "points": 10}
        ]
    })
}

mod posts {
    use super::*;

    #[tokio::test]
    async fn members_post_and_read_newest_first() {
        let app = TestApp::spawn().await;
        let (teacher, student, room_id) = app.classroom().await;

        let first = app
            .post_with_token(
                routes::POSTS,
                &json!({"room_id": room_id, "text": "Welcome"}),
                &teacher.token,
            )
            .await;
        assert_eq!(first.status, 201, "{}", first.text);

        let second = app
            .post_with_token(
                routes::POSTS,
                &json!({
                    "room_id": room_id,
                    "text": "",
                    "attachments": [{"fileUrl": "/api/v1/files/abc", "fileName": "notes.pdf"}]
                }),
                &student.token,
            )
            .await;
        assert_eq!(second.status, 201, "{}", second.text);

        let list = app.get_with_token(&routes::room_posts(room_id), &student.token).await;
        assert_eq!(list.status, 200);
        let posts = list.body.as_array().unwrap();
        assert_eq!(posts.len(), 2);
        assert_eq!(posts[0]["author_id"], student.id);
        assert_eq!(posts[0]["attachments"][0]["file_name"], "notes.pdf");
        assert_eq!(posts[1]["text"], "Welcome");
    }

    #[tokio::test]
    async fn empty_post_is_rejected() {
        let app = TestApp::spawn().await;
        let (teacher, _, room_id) = app.classroom().await;

        let res = app
            .post_with_token(
                routes::POSTS,
                &json!({"room_id": room_id, "text": "  "}),
                &teacher.token,
            )
            .await;

        assert_eq!(res.status, 400);
    }

    #[tokio::test]
    async fn outsiders_cannot_read_posts() {
        let app = TestApp::spawn().await;
        let (_, _, room_id) = app.classroom().await;
        let outsider = app.student("o@campus.test").await;

        let res = app.get_with_token(&routes::room_posts(room_id), &outsider.token).await;

        assert_eq!(res.status, 403);
    }
}

mod assignments {
    use super::*;

    #[tokio::test]
    async fn students_cannot_create_assignments() {
        let app = TestApp::spawn().await;
        let (_, student, room_id) = app.classroom().await;

        let res = app
            .post_with_token(routes::ASSIGNMENTS, &quiz(room_id), &student.token)
            .await;

        assert_eq!(res.status, 403);
    }

    #[tokio::test]
    async fn teachers_outside_the_room_cannot_create_assignments() {
        let app = TestApp::spawn().await;
        let (_, _, room_id) = app.classroom().await;
        let stranger = app.teacher("other@campus.test").await;

        let res = app
            .post_with_token(routes::ASSIGNMENTS, &quiz(room_id), &stranger.token)
            .await;

        assert_eq!(res.status, 403);
    }

    #[tokio::test]
    async fn students_do_not_see_answer_keys() {
        let app = TestApp::spawn().await;
        let (teacher, student, room_id) = app.classroom().await;
        create_assignment(&app, &teacher.token, quiz(room_id)).await;

        let seen_by_student = app
            .get_with_token(&routes::room_assignments(room_id), &student.token)
            .await;
        let seen_by_teacher = app
            .get_with_token(&routes::room_assignments(room_id), &teacher.token)
            .await;

        assert_eq!(seen_by_student.body[0]["questions"][0]["correct_answer"], "");
        assert_eq!(seen_by_teacher.body[0]["questions"][0]["correct_answer"], "4");
        assert_eq!(seen_by_student.body[0]["total_points"], 10.0);
    }

    #[tokio::test]
    async fn targeted_assignments_are_hidden_from_others() {
        let app = TestApp::spawn().await;
        let (teacher, student, room_id) = app.classroom().await;
        let other = app.student("other@campus.test").await;
        let code = app.get_with_token(&routes::room(room_id), &teacher.token).await.body["code"]
            .as_str()
            .unwrap()
            .to_string();
        app.join_room(&other.token, &code).await;

        let mut body = quiz(room_id);
        body["assigned_to"] = json!([other.id]);
        let id = create_assignment(&app, &teacher.token, body).await;

        let list = app
            .get_with_token(&routes::room_assignments(room_id), &student.token)
            .await;
        assert!(list.body.as_array().unwrap().is_empty());

        let res = app
            .post_with_token(
                routes::SUBMISSIONS,
                &json!({"assignment_id": id, "answers": [{"answer": "4"}]}),
                &student.token,
            )
            .await;
        assert_eq!(res.status, 403);

        submit(&app, &other.token, id, json!([{"answer": "4"}])).await;
    }

    #[tokio::test]
    async fn assigning_only_non_members_is_rejected() {
        let app = TestApp::spawn().await;
        let (teacher, _, room_id) = app.classroom().await;
        let outsider = app.student("o@campus.test").await;

        let mut body = quiz(room_id);
        body["assigned_to"] = json!([outsider.id]);
        let res = app.post_with_token(routes::ASSIGNMENTS, &body, &teacher.token).await;

        assert_eq!(res.status, 400);
    }

    #[tokio::test]
    async fn deleting_an_assignment_removes_its_submissions() {
        let app = TestApp::spawn().await;
        let (teacher, student, room_id) = app.classroom().await;
        let id = create_assignment(&app, &teacher.token, quiz(room_id)).await;
        submit(&app, &student.token, id, json!([{"answer": "4"}])).await;

        let res = app.delete_with_token(&routes::assignment(id), &student.token).await;
        assert_eq!(res.status, 403);

        let res = app.delete_with_token(&routes::assignment(id), &teacher.token).await;
        assert_eq!(res.status, 204);

        let res = app.get_with_token(&routes::my_submission(id), &student.token).await;
        assert_eq!(res.status, 404);
    }
}

mod submissions {
    use super::*;

    #[tokio::test]
    async fn answers_are_auto_graded_ignoring_whitespace() {
        let app = TestApp::spawn().await;
        let (teacher, student, room_id) = app.classroom().await;
        let id = create_assignment(&app, &teacher.token, quiz(room_id)).await;

        let right = submit(&app, &student.token, id, json!([{"questionIndex": 0, "answer": " 4 "}])).await;
        assert_eq!(right["grade"], 10.0);
        assert_eq!(right["graded_by"], Value::Null);

        let wrong = submit(&app, &student.token, id, json!([{"questionIndex": 0, "answer": "five"}])).await;
        assert_eq!(wrong["grade"], 0.0);
        assert_eq!(wrong["id"], right["id"]);

        let all = app
            .get_with_token(&routes::assignment_submissions(id), &teacher.token)
            .await;
        assert_eq!(all.status, 200);
        assert_eq!(all.body.as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn auto_grade_is_capped_at_total_points() {
        let app = TestApp::spawn().await;
        let (teacher, student, room_id) = app.classroom().await;
        let id = create_assignment(
            &app,
            &teacher.token,
            json!({
                "room_id": room_id,
                "title": "Capped",
                "total_points": 15,
                "questions": [
                    {"text": "a", "correct_answer": "x", "points": 10},
                    {"text": "b", "correct_answer": "y", "points": 10}
                ]
            }),
        )
        .await;

        let res = submit(
            &app,
            &student.token,
            id,
            json!([{"answer": "x"}, {"answer": "Y"}]),
        )
        .await;

        assert_eq!(res["grade"], 15.0);
    }

    #[tokio::test]
    async fn malformed_answer_entries_are_dropped() {
        let app = TestApp::spawn().await;
        let (teacher, student, room_id) = app.classroom().await;
        let id = create_assignment(&app, &teacher.token, quiz(room_id)).await;

        let res = submit(
            &app,
            &student.token,
            id,
            json!(["4", {"questionIndex": "zero", "answer": "4"}, {"question_index": 0, "answer": 4}]),
        )
        .await;

        let answers = res["answers"].as_array().unwrap();
        assert_eq!(answers.len(), 1);
        assert_eq!(answers[0]["answer"], "4");
        assert_eq!(res["grade"], 10.0);
    }

    #[tokio::test]
    async fn manual_grade_is_clamped_and_records_the_grader() {
        let app = TestApp::spawn().await;
        let (teacher, student, room_id) = app.classroom().await;
        let id = create_assignment(&app, &teacher.token, quiz(room_id)).await;
        let sub = submit(&app, &student.token, id, json!([{"answer": "3"}])).await;
        let sub_id = sub["id"].as_i64().unwrap() as i32;

        let res = app
            .post_with_token(&routes::grade(sub_id), &json!({"grade": 50}), &student.token)
            .await;
        assert_eq!(res.status, 403);

        let res = app
            .post_with_token(&routes::grade(sub_id), &json!({"grade": 50}), &teacher.token)
            .await;
        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["grade"], 10.0);
        assert_eq!(res.body["graded_by"], teacher.id);
    }

    #[tokio::test]
    async fn resubmitting_keeps_a_manual_grade_without_answer_key() {
        let app = TestApp::spawn().await;
        let (teacher, student, room_id) = app.classroom().await;
        let id = create_assignment(
            &app,
            &teacher.token,
            json!({
                "room_id": room_id,
                "title": "Essay",
                "questions": [{"text": "Discuss", "points": 20}]
            }),
        )
        .await;

        let first = app
            .post_with_token(
                routes::SUBMISSIONS,
                &json!({"assignment_id": id, "text": "Draft"}),
                &student.token,
            )
            .await;
        assert_eq!(first.status, 200, "{}", first.text);
        assert_eq!(first.body["grade"], Value::Null);

        app.post_with_token(&routes::grade(first.id()), &json!({"grade": 17}), &teacher.token)
            .await;

        let again = app
            .post_with_token(
                routes::SUBMISSIONS,
                &json!({"assignment_id": id, "text": "Final"}),
                &student.token,
            )
            .await;
        assert_eq!(again.body["text"], "Final");
        assert_eq!(again.body["grade"], 17.0);
        assert_eq!(again.body["graded_by"], teacher.id);

        let mine = app.get_with_token(&routes::my_submission(id), &student.token).await;
        assert_eq!(mine.status, 200);
        assert_eq!(mine.body["id"], first.body["id"]);
    }

    #[tokio::test]
    async fn resubmitting_with_an_answer_key_replaces_the_manual_grade() {
        let app = TestApp::spawn().await;
        let (teacher, student, room_id) = app.classroom().await;
        let id = create_assignment(&app, &teacher.token, quiz(room_id)).await;
        let first = submit(&app, &student.token, id, json!([{"answer": "5"}])).await;
        assert_eq!(first["grade"], 0.0);
        let sub_id = first["id"].as_i64().unwrap() as i32;

        let graded = app
            .post_with_token(&routes::grade(sub_id), &json!({"grade": 6}), &teacher.token)
            .await;
        assert_eq!(graded.body["graded_by"], teacher.id);

        let again = submit(&app, &student.token, id, json!([{"answer": "4"}])).await;

        assert_eq!(again["id"], first["id"]);
        assert_eq!(again["grade"], 10.0);
        assert_eq!(again["graded_by"], Value::Null);
    }

    #[tokio::test]
    async fn concurrent_resubmissions_keep_one_row() {
        let app = TestApp::spawn().await;
        let (teacher, student, room_id) = app.classroom().await;
        let id = create_assignment(&app, &teacher.token, quiz(room_id)).await;

        let attempts = (0..8).map(|i| {
            let answer = if i % 2 == 0 { "4" } else { "wrong" };
            submit(&app, &student.token, id, json!([{"answer": answer}]))
        });
        let results = join_all(attempts).await;

        let first_id = results[0]["id"].clone();
        assert!(results.iter().all(|r| r["id"] == first_id));

        let res = app
            .get_with_token(&routes::assignment_submissions(id), &teacher.token)
            .await;
        assert_eq!(res.status, 200, "{}", res.text);
        let rows = res.body.as_array().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["student_id"], student.id);
    }

    #[tokio::test]
    async fn my_submission_is_not_found_before_submitting() {
        let app = TestApp::spawn().await;
        let (teacher, student, room_id) = app.classroom().await;
        let id = create_assignment(&app, &teacher.token, quiz(room_id)).await;

        let res = app.get_with_token(&routes::my_submission(id), &student.token).await;

        assert_eq!(res.status, 404);
    }
}
