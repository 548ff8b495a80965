use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use common::storage::FilesystemFileStore;
use futures::{SinkExt, StreamExt};
use reqwest::Client;
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};
use serde_json::{Value, json};
use tempfile::TempDir;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};

use study_server::config::{
    AppConfig, AuthConfig, ChatConfig, CorsConfig, DatabaseConfig, ServerConfig, StorageConfig,
};
use study_server::entity::user;
use study_server::realtime::ChatHub;
use study_server::state::AppState;

pub const PASSWORD: &str = "securepass";
pub const ADMIN_EMAIL: &str = "admin@campus.test";

pub mod routes {
    pub const REGISTER: &str = "/api/v1/auth/register";
    pub const LOGIN: &str = "/api/v1/auth/login";
    pub const ME: &str = "/api/v1/auth/me";
    pub const USERS: &str = "/api/v1/users";
    pub const DEPARTMENTS: &str = "/api/v1/academic/departments";
    pub const SECTIONS: &str = "/api/v1/academic/sections";
    pub const INTAKES: &str = "/api/v1/academic/intakes";
    pub const ROUTINES: &str = "/api/v1/academic/routines";
    pub const STUDENTS: &str = "/api/v1/students";
    pub const MY_STUDENT: &str = "/api/v1/students/me";
    pub const MY_TEACHER: &str = "/api/v1/teachers/me";
    pub const TEACHERS: &str = "/api/v1/users/teachers";
    pub const SCHEDULES: &str = "/api/v1/schedules";
    pub const CALENDAR: &str = "/api/v1/schedules/calendar";
    pub const COURSEWORK: &str = "/api/v1/assignments";
    pub const COURSEWORK_BY_TYPE: &str = "/api/v1/assignments/by-type";
    pub const ROOMS: &str = "/api/v1/rooms";
    pub const JOIN_ROOM: &str = "/api/v1/rooms/join";
    pub const POSTS: &str = "/api/v1/classroom/posts";
    pub const ASSIGNMENTS: &str = "/api/v1/classroom/assignments";
    pub const SUBMISSIONS: &str = "/api/v1/classroom/submissions";
    pub const RESOURCES: &str = "/api/v1/resources";
    pub const UPLOADS: &str = "/api/v1/uploads";
    pub const CHAT_UPLOAD: &str = "/api/v1/chat/upload";
    pub const HEALTH: &str = "/health";

    pub fn user(id: i32) -> String {
        format!("/api/v1/users/{id}")
    }

    pub fn approve(id: i32) -> String {
        format!("/api/v1/users/{id}/approve")
    }

    pub fn department(id: i32) -> String {
        format!("/api/v1/academic/departments/{id}")
    }

    pub fn intake(id: i32) -> String {
        format!("/api/v1/academic/intakes/{id}")
    }

    pub fn routine(id: i32) -> String {
        format!("/api/v1/academic/routines/{id}")
    }

    pub fn student(id: i32) -> String {
        format!("/api/v1/students/{id}")
    }

    pub fn approve_student(id: i32) -> String {
        format!("/api/v1/students/{id}/approve")
    }

    pub fn schedule(id: i32) -> String {
        format!("/api/v1/schedules/{id}")
    }

    pub fn coursework(id: i32) -> String {
        format!("/api/v1/assignments/{id}")
    }

    pub fn room(id: i32) -> String {
        format!("/api/v1/rooms/{id}")
    }

    pub fn room_posts(room_id: i32) -> String {
        format!("/api/v1/classroom/rooms/{room_id}/posts")
    }

    pub fn room_assignments(room_id: i32) -> String {
        format!("/api/v1/classroom/rooms/{room_id}/assignments")
    }

    pub fn assignment(id: i32) -> String {
        format!("/api/v1/classroom/assignments/{id}")
    }

    pub fn assignment_submissions(id: i32) -> String {
        format!("/api/v1/classroom/assignments/{id}/submissions")
    }

    pub fn my_submission(id: i32) -> String {
        format!("/api/v1/classroom/assignments/{id}/mine")
    }

    pub fn grade(submission_id: i32) -> String {
        format!("/api/v1/classroom/submissions/{submission_id}/grade")
    }

    pub fn room_resources(room_id: i32) -> String {
        format!("/api/v1/resources/rooms/{room_id}")
    }

    pub fn resource(id: i32) -> String {
        format!("/api/v1/resources/{id}")
    }

    pub fn chat_history(room_id: i32) -> String {
        format!("/api/v1/chat/{room_id}")
    }

    pub fn chat_presence(room_id: i32) -> String {
        format!("/api/v1/chat/{room_id}/presence")
    }
}

/// A running test server backed by an in-memory SQLite database.
pub struct TestApp {
    pub addr: SocketAddr,
    pub client: Client,
    pub db: DatabaseConnection,
    /// Keeps the upload directory alive for the lifetime of the test.
    _files_dir: TempDir,
}

/// Parsed HTTP response for test assertions.
pub struct TestResponse {
    pub status: u16,
    /// Raw response body as text.
    pub text: String,
    /// Parsed JSON body, or `Null` if the response is not valid JSON.
    pub body: Value,
    pub headers: reqwest::header::HeaderMap,
}

/// A user created through the API, with a fresh token.
pub struct TestUser {
    pub id: i32,
    pub token: String,
}

#[derive(Clone, Copy)]
pub struct Cohort {
    pub department_id: i32,
    pub section_id: i32,
    pub intake_id: i32,
}

pub type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;

pub fn test_config() -> AppConfig {
    AppConfig {
        server: ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
            cors: CorsConfig {
                allow_origins: vec!["*".to_string()],
                max_age: 3600,
            },
        },
        database: DatabaseConfig {
            url: "sqlite::memory:".to_string(),
            // One connection, so every query sees the same in-memory database.
            max_connections: 1,
        },
        auth: AuthConfig {
            jwt_secret: "test-secret-for-integration-tests".to_string(),
            token_ttl_hours: 1,
            admin_email: Some(ADMIN_EMAIL.to_string()),
            admin_password: Some(PASSWORD.to_string()),
        },
        storage: StorageConfig {
            data_dir: String::new(),
            max_upload_size: 1024 * 1024,
        },
        chat: ChatConfig { history_limit: 100 },
    }
}

impl TestApp {
    pub async fn spawn() -> Self {
        let files_dir = tempfile::tempdir().expect("Failed to create upload dir");
        let mut config = test_config();
        config.storage.data_dir = files_dir.path().to_string_lossy().into_owned();

        let db = study_server::database::init_db(&config.database)
            .await
            .expect("Failed to initialize database");
        study_server::seed::seed_role_permissions(&db)
            .await
            .expect("Failed to seed permissions");
        study_server::seed::ensure_indexes(&db)
            .await
            .expect("Failed to create indexes");
        study_server::seed::seed_admin(&db, &config.auth)
            .await
            .expect("Failed to seed admin");

        let files = FilesystemFileStore::new(files_dir.path(), config.storage.max_upload_size)
            .await
            .expect("Failed to open file store");

        let state = AppState {
            db: db.clone(),
            config: Arc::new(config),
            files: Arc::new(files),
            hub: Arc::new(ChatHub::new()),
        };
        let app = study_server::build_router(state);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind to random port");
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            addr,
            client: Client::new(),
            db,
            _files_dir: files_dir,
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    pub async fn post_with_token(&self, path: &str, body: &Value, token: &str) -> TestResponse {
        let res = self
            .client
            .post(self.url(path))
            .header("Authorization", format!("Bearer {token}"))
            .json(body)
            .send()
            .await
            .expect("Failed to send POST request");

        TestResponse::from_response(res).await
    }

    pub async fn post_without_token(&self, path: &str, body: &Value) -> TestResponse {
        let res = self
            .client
            .post(self.url(path))
            .json(body)
            .send()
            .await
            .expect("Failed to send POST request");

        TestResponse::from_response(res).await
    }

    pub async fn get_with_token(&self, path: &str, token: &str) -> TestResponse {
        let res = self
            .client
            .get(self.url(path))
            .header("Authorization", format!("Bearer {token}"))
            .send()
            .await
            .expect("Failed to send GET request");

        TestResponse::from_response(res).await
    }

    pub async fn get_without_token(&self, path: &str) -> TestResponse {
        let res = self
            .client
            .get(self.url(path))
            .send()
            .await
            .expect("Failed to send GET request");

        TestResponse::from_response(res).await
    }

    pub async fn patch_with_token(&self, path: &str, body: &Value, token: &str) -> TestResponse {
        let res = self
            .client
            .patch(self.url(path))
            .header("Authorization", format!("Bearer {token}"))
            .json(body)
            .send()
            .await
            .expect("Failed to send PATCH request");

        TestResponse::from_response(res).await
    }

    pub async fn put_with_token(&self, path: &str, body: &Value, token: &str) -> TestResponse {
        let res = self
            .client
            .put(self.url(path))
            .header("Authorization", format!("Bearer {token}"))
            .json(body)
            .send()
            .await
            .expect("Failed to send PUT request");

        TestResponse::from_response(res).await
    }

    pub async fn delete_with_token(&self, path: &str, token: &str) -> TestResponse {
        let res = self
            .client
            .delete(self.url(path))
            .header("Authorization", format!("Bearer {token}"))
            .send()
            .await
            .expect("Failed to send DELETE request");

        TestResponse::from_response(res).await
    }

    pub async fn upload_with_token(
        &self,
        path: &str,
        file_name: &str,
        file_bytes: Vec<u8>,
        token: &str,
    ) -> TestResponse {
        let part = reqwest::multipart::Part::bytes(file_bytes).file_name(file_name.to_string());
        let form = reqwest::multipart::Form::new().part("file", part);

        let res = self
            .client
            .post(self.url(path))
            .header("Authorization", format!("Bearer {token}"))
            .multipart(form)
            .send()
            .await
            .expect("Failed to send multipart upload request");

        TestResponse::from_response(res).await
    }

    pub async fn login(&self, email: &str) -> String {
        let res = self
            .post_without_token(routes::LOGIN, &json!({"email": email, "password": PASSWORD}))
            .await;
        assert_eq!(res.status, 200, "Login failed: {}", res.text);
        res.body["token"]
            .as_str()
            .expect("Login response should contain a token")
            .to_string()
    }

    pub async fn admin(&self) -> TestUser {
        let token = self.login(ADMIN_EMAIL).await;
        let me = self.get_with_token(routes::ME, &token).await;
        TestUser {
            id: me.id(),
            token,
        }
    }

    /// Register through the API with the given self-service role and log in.
    pub async fn register(&self, email: &str, role: &str) -> TestUser {
        let reg = self
            .post_without_token(
                routes::REGISTER,
                &json!({
                    "email": email,
                    "password": PASSWORD,
                    "full_name": email.split('@').next().unwrap_or(email),
                    "role": role,
                }),
            )
            .await;
        assert_eq!(reg.status, 201, "Registration failed: {}", reg.text);

        TestUser {
            id: reg.id(),
            token: self.login(email).await,
        }
    }

    pub async fn teacher(&self, email: &str) -> TestUser {
        self.register(email, "teacher").await
    }

    /// A student who has already been approved.
    pub async fn student(&self, email: &str) -> TestUser {
        let student = self.register(email, "student").await;
        let db_user = user::Entity::find()
            .filter(user::Column::Email.eq(email))
            .one(&self.db)
            .await
            .expect("DB query failed")
            .expect("User not found after registration");
        let mut active: user::ActiveModel = db_user.into();
        active.is_approved = Set(true);
        active.update(&self.db).await.expect("Failed to approve user");
        student
    }

    /// Create a room and return `(id, code)`.
    pub async fn create_room(&self, token: &str, title: &str) -> (i32, String) {
        let res = self
            .post_with_token(routes::ROOMS, &json!({"title": title}), token)
            .await;
        assert_eq!(res.status, 201, "create_room failed: {}", res.text);
        let code = res.body["code"].as_str().unwrap().to_string();
        (res.id(), code)
    }

    pub async fn join_room(&self, token: &str, code: &str) {
        let res = self
            .post_with_token(routes::JOIN_ROOM, &json!({"code": code}), token)
            .await;
        assert_eq!(res.status, 200, "join_room failed: {}", res.text);
    }

    /// A room owned by a fresh teacher, joined by one approved student.
    pub async fn classroom(&self) -> (TestUser, TestUser, i32) {
        let teacher = self.teacher("teacher@campus.test").await;
        let student = self.student("student@campus.test").await;
        let (room_id, code) = self.create_room(&teacher.token, "Algorithms").await;
        self.join_room(&student.token, &code).await;
        (teacher, student, room_id)
    }

    /// Create a department, a section and an intake; returns their IDs.
    pub async fn cohort(&self, token: &str) -> Cohort {
        let department = self
            .post_with_token(
                routes::DEPARTMENTS,
                &json!({"name": "Computer Science", "code": "CSE"}),
                token,
            )
            .await;
        assert_eq!(department.status, 201, "department: {}", department.text);
        let section = self
            .post_with_token(routes::SECTIONS, &json!({"section": "A"}), token)
            .await;
        assert_eq!(section.status, 201, "section: {}", section.text);
        let intake = self
            .post_with_token(routes::INTAKES, &json!({"intake": 51}), token)
            .await;
        assert_eq!(intake.status, 201, "intake: {}", intake.text);
        Cohort {
            department_id: department.id(),
            section_id: section.id(),
            intake_id: intake.id(),
        }
    }

    pub async fn connect(&self, token: &str) -> Socket {
        let url = format!("ws://{}/api/v1/ws?token={}", self.addr, token);
        let (socket, _) = connect_async(url)
            .await
            .expect("WebSocket handshake failed");
        socket
    }
}

impl TestResponse {
    pub async fn from_response(res: reqwest::Response) -> Self {
        let status = res.status().as_u16();
        let headers = res.headers().clone();
        let text = res.text().await.unwrap_or_default();
        let body = serde_json::from_str(&text).unwrap_or(Value::Null);
        Self {
            status,
            text,
            body,
            headers,
        }
    }

    pub fn id(&self) -> i32 {
        self.body["id"]
            .as_i64()
            .expect("response body should contain 'id'") as i32
    }
}

pub async fn send_event(socket: &mut Socket, event: &str, data: Value) {
    let frame = json!({"event": event, "data": data}).to_string();
    socket
        .send(Message::text(frame))
        .await
        .expect("Failed to send WebSocket frame");
}

/// Next JSON event from the server, failing the test after a timeout.
pub async fn next_event(socket: &mut Socket) -> Value {
    let wait = async {
        loop {
            match socket.next().await {
                Some(Ok(Message::Text(text))) => {
                    return serde_json::from_str::<Value>(text.as_str())
                        .expect("Server sent invalid JSON");
                }
                Some(Ok(_)) => continue,
                other => panic!("WebSocket closed unexpectedly: {other:?}"),
            }
        }
    };
    tokio::time::timeout(Duration::from_secs(5), wait)
        .await
        .expect("Timed out waiting for a server event")
}

/// Skip events until one with the given name arrives.
pub async fn next_named(socket: &mut Socket, event: &str) -> Value {
    loop {
        let next = next_event(socket).await;
        if next["event"] == event {
            return next;
        }
    }
}

/// Assert that nothing arrives within a short window.
pub async fn assert_silent(socket: &mut Socket) {
    let res = tokio::time::timeout(Duration::from_millis(300), socket.next()).await;
    if let Ok(Some(Ok(Message::Text(text)))) = res {
        panic!("Expected no event, got {}", text.as_str());
    }
}

/// Join a room over the socket and wait for the confirmation.
pub async fn join(socket: &mut Socket, room_id: i32) -> Value {
    send_event(socket, "joinRoom", json!({"roomId": room_id})).await;
    next_named(socket, "joined").await
}
