pub mod academic;
pub mod auth;
pub mod chat;
pub mod classroom;
pub mod coursework;
pub mod health;
pub mod resource;
pub mod room;
pub mod schedule;
pub mod student;
pub mod teacher;
pub mod upload;
pub mod user;
