//! Orgadmin - administrative backend for an organisation
//!
//! This crate manages the department and menu hierarchies together with posts,
//! roles and users, exposing them as a JSON API over axum and sea-orm.

pub mod config;
pub mod db;
pub mod entity;
pub mod error;
pub mod extract;
pub mod handlers;
pub mod routes;
pub mod service;
pub mod state;

// Re-export commonly used types
pub use config::Config;
pub use error::{AppError, AppResult};
pub use state::AppState;
