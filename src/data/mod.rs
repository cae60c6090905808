//! Data layer module
//!
//! Handles all data persistence:
//! - SQLite database operations
//! - Row models and the normalized feed query

mod database;
mod models;

pub use database::Database;
pub use models::*;
