pub mod profile;
pub mod user;
pub mod vision;
