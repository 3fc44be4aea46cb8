pub mod auth_service;
pub mod bookmark_service;
