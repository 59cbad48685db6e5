//! A small polls site: visitors browse published questions, staff manage
//! questions and their choices through the admin console.

pub mod admin;
pub mod app;
pub mod config;
pub mod error;
pub mod loader;
pub mod models;
pub mod routes;
pub mod store;
pub mod templates;
pub mod views;

pub use app::{AppState, router};
pub use error::AppError;
