//! Data layer: storage types, SQLite service, and repositories

pub mod sqlite;
pub mod types;

pub use sqlite::{SqliteError, SqlitePool, SqliteService};
