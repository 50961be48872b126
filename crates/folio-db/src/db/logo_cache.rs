use chrono::{DateTime, Utc};
use folio_core::models::{LogoCacheEntry, LogoSource};
use folio_core::AppError;
use sqlx::SqlitePool;

/// Repository for the persisted name -> logo file mapping.
///
/// Lookups are by exact name (case-sensitive, no normalization beyond the
/// trim the caller performs). Writes are atomic upserts so a concurrent
/// double-resolution of the same name ends with a single row, last write
/// wins.
#[derive(Clone)]
pub struct LogoCacheRepository {
    pool: SqlitePool,
}

#[derive(sqlx::FromRow)]
struct LogoCacheRow {
    name: String,
    storage_key: String,
    source: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<LogoCacheRow> for LogoCacheEntry {
    fn from(row: LogoCacheRow) -> Self {
        LogoCacheEntry {
            name: row.name,
            storage_key: row.storage_key,
            // Rows are only written through upsert() with a known source.
            source: LogoSource::parse(&row.source).unwrap_or(LogoSource::Clearbit),
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

impl LogoCacheRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Look up the cache entry for an exact name.
    pub async fn get(&self, name: &str) -> Result<Option<LogoCacheEntry>, AppError> {
        let row = sqlx::query_as::<_, LogoCacheRow>(
            r#"
            SELECT name, storage_key, source, created_at, updated_at
            FROM logo_cache
            WHERE name = ?1
            "#,
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Into::into))
    }

    /// Record the mapping from a name to a materialized logo file,
    /// overwriting any previous entry for that exact name. Callers must only
    /// invoke this after the backing file write has succeeded.
    pub async fn upsert(
        &self,
        name: &str,
        storage_key: &str,
        source: LogoSource,
    ) -> Result<(), AppError> {
        let now = Utc::now();
        sqlx::query(
            r#"
            INSERT INTO logo_cache (name, storage_key, source, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?4)
            ON CONFLICT(name) DO UPDATE SET
                storage_key = excluded.storage_key,
                source = excluded.source,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(name)
        .bind(storage_key)
        .bind(source.as_str())
        .bind(now)
        .execute(&self.pool)
        .await?;

        tracing::debug!(name, storage_key, source = %source, "Logo cache entry written");

        Ok(())
    }

    /// Number of cached entries.
    pub async fn count(&self) -> Result<i64, AppError> {
        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM logo_cache")
            .fetch_one(&self.pool)
            .await?;
        Ok(count.0)
    }
}
