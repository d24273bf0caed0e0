//! Profile store on SQLite

pub mod db;
pub mod migrations;

// Re-exports for convenience
pub use db::{create_pool, get_connection, DbConnection, DbPool, ProfileField, ProfileStore};
