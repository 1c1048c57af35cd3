//! SQLite pool construction and embedded schema migration.

use sqlx::{SqlitePool, sqlite::SqlitePoolOptions};
use std::sync::Arc;
use tracing::debug;

/// Schema statements, embedded so one-shot `--migrate` runs and tests never
/// depend on the working directory.
pub const MIGRATION_SQL: &str = include_str!("../migrations/0001_init.sql");

/// Open a connection pool for the given database URL.
pub async fn connect(database_url: &str) -> Result<Arc<SqlitePool>, sqlx::Error> {
    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect(database_url)
        .await?;
    Ok(Arc::new(pool))
}

/// Apply the embedded schema. Statements are `IF NOT EXISTS`, so re-running
/// is harmless.
pub async fn run_migrations(db: &SqlitePool) -> Result<(), sqlx::Error> {
    let statements = MIGRATION_SQL
        .split(';')
        .map(str::trim)
        .filter(|s| !s.is_empty());

    for stmt in statements {
        debug!("executing migration SQL: {}", stmt);
        sqlx::query(stmt).execute(db).await?;
    }

    Ok(())
}
