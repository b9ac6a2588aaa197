use std::time::Duration;

use sqlx::sqlite::SqlitePoolOptions;

use tia_core::config::DatabaseConfig;

pub type DbPool = sqlx::SqlitePool;

// Applied to every pooled connection. Foreign keys are off by default in
// SQLite and the premiums table relies on them.
const SESSION_PRAGMAS: &[&str] =
    &["PRAGMA foreign_keys = ON", "PRAGMA journal_mode = WAL", "PRAGMA busy_timeout = 5000"];

/// Opens a pool for the `[database]` config section.
pub async fn connect(settings: &DatabaseConfig) -> Result<DbPool, sqlx::Error> {
    SqlitePoolOptions::new()
        .max_connections(settings.max_connections.max(1))
        .acquire_timeout(Duration::from_secs(settings.timeout_secs.max(1)))
        .after_connect(|conn, _meta| {
            Box::pin(async move {
                for pragma in SESSION_PRAGMAS {
                    sqlx::query(pragma).execute(&mut *conn).await?;
                }
                Ok(())
            })
        })
        .connect(&settings.url)
        .await
}

/// Single-connection in-memory pool. Every `:memory:` connection is its own
/// database, so the pool must never grow past one; tests lean on this.
pub async fn connect_memory() -> Result<DbPool, sqlx::Error> {
    connect(&DatabaseConfig {
        url: "sqlite::memory:".to_string(),
        max_connections: 1,
        timeout_secs: 5,
    })
    .await
}
