//! File metadata repository: CRUD for the `files` table.

use chrono::{DateTime, Utc};
use sharedfiles_core::{AppError, FileRecord};
use sqlx::{Sqlite, SqlitePool};

/// Row type for the files table (for FromRow).
#[derive(Debug, sqlx::FromRow)]
pub struct FileRecordRow {
    pub id: String,
    pub filename: String,
    pub mime_type: String,
    pub size_bytes: i64,
    pub url: String,
    pub uploaded_at: DateTime<Utc>,
}

impl FileRecordRow {
    pub fn to_file_record(self) -> FileRecord {
        FileRecord {
            id: self.id,
            filename: self.filename,
            mime_type: self.mime_type,
            size_bytes: self.size_bytes.max(0) as u64,
            uploaded_at: self.uploaded_at,
            url: self.url,
        }
    }
}

/// Repository for the files table.
#[derive(Clone)]
pub struct FileRecordRepository {
    pool: SqlitePool,
}

impl FileRecordRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert one record. Fails on a duplicate id.
    #[tracing::instrument(skip(self, record), fields(db.table = "files", db.record_id = %record.id))]
    pub async fn insert(&self, record: &FileRecord) -> Result<(), AppError> {
        let size_bytes = i64::try_from(record.size_bytes)
            .map_err(|_| AppError::InvalidInput("File size out of range".to_string()))?;

        sqlx::query(
            r#"
            INSERT INTO files (id, filename, mime_type, size_bytes, url, uploaded_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&record.id)
        .bind(&record.filename)
        .bind(&record.mime_type)
        .bind(size_bytes)
        .bind(&record.url)
        .bind(record.uploaded_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Fetch a record by id.
    #[tracing::instrument(skip(self), fields(db.table = "files", db.record_id = %id))]
    pub async fn get(&self, id: &str) -> Result<Option<FileRecord>, AppError> {
        let row: Option<FileRecordRow> = sqlx::query_as::<Sqlite, FileRecordRow>(
            "SELECT id, filename, mime_type, size_bytes, url, uploaded_at FROM files WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(FileRecordRow::to_file_record))
    }

    /// Delete a record; returns whether a row was removed.
    #[tracing::instrument(skip(self), fields(db.table = "files", db.record_id = %id))]
    pub async fn delete(&self, id: &str) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM files WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// All records, oldest first.
    #[tracing::instrument(skip(self), fields(db.table = "files"))]
    pub async fn list(&self) -> Result<Vec<FileRecord>, AppError> {
        let rows: Vec<FileRecordRow> = sqlx::query_as::<Sqlite, FileRecordRow>(
            "SELECT id, filename, mime_type, size_bytes, url, uploaded_at FROM files ORDER BY uploaded_at, id",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(FileRecordRow::to_file_record).collect())
    }
}
