pub mod admin;
pub mod auth;
#[cfg(test)]
mod auth_test;
pub mod chat;
#[cfg(test)]
mod chat_test;
pub mod password_reset;
#[cfg(test)]
mod password_reset_test;
pub mod profile;
pub mod vision;
#[cfg(test)]
mod vision_test;
