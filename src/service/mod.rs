pub mod chat;
pub mod notification;
pub mod profile;
pub mod vision;
