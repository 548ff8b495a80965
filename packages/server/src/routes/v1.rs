use axum::routing::{get, post};
use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;

use crate::config::AppConfig;
use crate::handlers::{
    academic, auth, chat, classroom, coursework, resource, room, schedule, student, teacher,
    upload, user,
};
use crate::state::AppState;

pub fn routes(config: &AppConfig) -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .nest("/auth", auth_routes())
        .nest("/users", user_routes())
        .nest("/academic", academic_routes())
        .nest("/students", student_routes())
        .nest("/teachers", teacher_routes())
        .nest("/schedules", schedule_routes())
        .nest("/assignments", coursework_routes())
        .nest("/rooms", room_routes())
        .nest("/classroom", classroom_routes())
        .nest("/resources", resource_routes())
        .nest("/chat", chat_routes(config))
        .nest("/uploads", upload_routes(config))
        .nest("/files", file_routes())
        .route("/ws", get(chat::chat_socket))
}

fn auth_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(auth::register))
        .routes(routes!(auth::login))
        .routes(routes!(auth::me, auth::update_me))
}

fn user_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(user::list_users))
        .routes(routes!(user::update_user))
        .routes(routes!(user::approve_user))
        .routes(routes!(teacher::list_teachers))
}

fn academic_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(academic::list_departments, academic::create_department))
        .routes(routes!(academic::update_department, academic::delete_department))
        .routes(routes!(academic::list_sections, academic::create_section))
        .routes(routes!(academic::update_section, academic::delete_section))
        .routes(routes!(academic::list_intakes, academic::create_intake))
        .routes(routes!(academic::update_intake, academic::delete_intake))
        .routes(routes!(academic::list_routines, academic::create_routine))
        .routes(routes!(academic::update_routine, academic::delete_routine))
}

fn student_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(student::list_students, student::create_student))
        .routes(routes!(student::my_student, student::update_my_student))
        .routes(routes!(
            student::get_student,
            student::update_student,
            student::delete_student
        ))
        .routes(routes!(student::approve_student))
}

fn teacher_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new().routes(routes!(teacher::my_teacher, teacher::upsert_my_teacher))
}

fn schedule_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(schedule::list_schedules, schedule::create_schedule))
        .routes(routes!(schedule::calendar))
        .routes(routes!(
            schedule::get_schedule,
            schedule::update_schedule,
            schedule::delete_schedule
        ))
}

fn coursework_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(coursework::list_coursework, coursework::create_coursework))
        .routes(routes!(coursework::coursework_by_type))
        .routes(routes!(
            coursework::get_coursework,
            coursework::update_coursework,
            coursework::delete_coursework
        ))
}

fn room_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(room::list_rooms, room::create_room))
        .routes(routes!(room::join_room))
        .routes(routes!(room::get_room, room::delete_room))
}

fn classroom_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(classroom::list_posts))
        .routes(routes!(classroom::create_post))
        .routes(routes!(classroom::list_assignments))
        .routes(routes!(classroom::create_assignment))
        .routes(routes!(classroom::delete_assignment))
        .routes(routes!(classroom::list_submissions))
        .routes(routes!(classroom::my_submission))
        .routes(routes!(classroom::submit))
        .routes(routes!(classroom::grade_submission))
}

fn resource_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(resource::create_resource))
        .routes(routes!(resource::list_resources))
        .routes(routes!(resource::delete_resource))
}

fn chat_routes(config: &AppConfig) -> OpenApiRouter<AppState> {
    let upload_alias = OpenApiRouter::new()
        .route("/upload", post(upload::upload_file))
        .layer(upload::upload_body_limit(&config.storage));

    OpenApiRouter::new()
        .routes(routes!(chat::history))
        .routes(routes!(chat::presence))
        .merge(upload_alias)
}

fn upload_routes(config: &AppConfig) -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(upload::upload_file))
        .layer(upload::upload_body_limit(&config.storage))
}

fn file_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new().routes(routes!(upload::download_file))
}
