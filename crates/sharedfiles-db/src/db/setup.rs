//! Metadata store setup and schema bootstrap

use anyhow::{Context, Result};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use std::path::Path;
use std::time::Duration;

const MAX_CONNECTIONS: u32 = 5;
const ACQUIRE_TIMEOUT_SECS: u64 = 30;

/// Open (creating if needed) the SQLite metadata file and apply the schema.
///
/// The schema is embedded in the binary and idempotent, so an existing store
/// is left untouched.
pub async fn connect_metadata_store(path: impl AsRef<Path>) -> Result<SqlitePool> {
    let path = path.as_ref();
    tracing::info!(path = %path.display(), "Opening metadata store...");

    let options = SqliteConnectOptions::new()
        .filename(path)
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(Duration::from_secs(5));

    let pool = SqlitePoolOptions::new()
        .max_connections(MAX_CONNECTIONS)
        .acquire_timeout(Duration::from_secs(ACQUIRE_TIMEOUT_SECS))
        .connect_with(options)
        .await
        .with_context(|| format!("Failed to open metadata store {}", path.display()))?;

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .context("Failed to apply metadata schema")?;

    tracing::info!(path = %path.display(), "Metadata store ready");
    Ok(pool)
}
