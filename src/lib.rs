pub mod application;
pub mod client;
pub mod data;
pub mod domain;
pub mod infrastructure;
pub mod presentation;
pub mod ui;
