pub mod admin;
pub mod auth;
pub mod chat;
pub mod common;
pub mod password_reset;
pub mod profile;
pub mod vision;
