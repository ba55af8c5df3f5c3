pub mod auth;
pub mod constants;
pub mod db;
pub mod error;
pub mod handlers;
pub mod mail;
pub mod media;
pub mod models;
pub mod realtime;
pub mod services;
pub mod state;
pub mod utils;

#[cfg(test)]
mod testing;

pub use error::{AppError, AppResult};
pub use handlers::create_router;
pub use state::AppState;
pub use utils::config::Config;
pub use db::connection::get_db_pool;

// Re-export common types
pub use anyhow::Result;
pub use chrono::{DateTime, Utc};
pub use uuid::Uuid;
