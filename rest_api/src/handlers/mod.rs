// rest_api/src/handlers/mod.rs

pub mod assignments;
pub mod auth;
pub mod excel_upload;
pub mod export;
pub mod operations;
pub mod students;
pub mod users;
