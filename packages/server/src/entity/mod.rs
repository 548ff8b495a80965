pub mod chat_message;
pub mod class_assignment;
pub mod class_post;
pub mod class_routine;
pub mod coursework;
pub mod department;
pub mod intake;
pub mod resource;
pub mod role;
pub mod role_permission;
pub mod room;
pub mod room_member;
pub mod schedule;
pub mod schedule_section;
pub mod section;
pub mod student;
pub mod submission;
pub mod teacher;
pub mod upload;
pub mod user;
