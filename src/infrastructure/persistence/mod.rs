//! SQLite persistence adapters

mod saved_set_repository;

pub use saved_set_repository::SqliteSavedSetRepository;

use anyhow::{Context, Result};
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;

/// Open the console database, creating the file when missing
pub async fn connect(database_url: &str) -> Result<SqlitePool> {
    SqlitePoolOptions::new()
        .max_connections(5)
        .connect(database_url)
        .await
        .with_context(|| format!("Failed to open database {}", database_url))
}
