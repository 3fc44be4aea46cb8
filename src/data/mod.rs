pub mod bookmark_repository;
pub mod database;
pub mod query;
pub mod tags;
pub mod user_repository;
