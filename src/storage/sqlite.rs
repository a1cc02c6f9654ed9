use crate::models::ShortenedUrlRecord;
use crate::storage::{matches_query, page_bounds, search_needle, Storage, StorageResult};
use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;
use std::sync::Arc;

const COLUMNS: &str =
    "short_url, long_url, provider, favorite, title, description, created_at, qr_png";

pub struct SqliteStorage {
    pool: Arc<SqlitePool>,
}

impl SqliteStorage {
    pub async fn new(database_url: &str, max_connections: u32) -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await
            .with_context(|| format!("failed to open {database_url}"))?;
        Ok(Self {
            pool: Arc::new(pool),
        })
    }
}

#[async_trait]
impl Storage for SqliteStorage {
    async fn init(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS urls (
                short_url TEXT PRIMARY KEY NOT NULL,
                long_url TEXT NOT NULL,
                provider TEXT NOT NULL,
                favorite INTEGER NOT NULL DEFAULT 0,
                title TEXT,
                description TEXT,
                created_at INTEGER NOT NULL,
                qr_png BLOB
            )
            "#,
        )
        .execute(self.pool.as_ref())
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_provider_long_url ON urls(provider, long_url)")
            .execute(self.pool.as_ref())
            .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_created_at ON urls(created_at)")
            .execute(self.pool.as_ref())
            .await?;

        Ok(())
    }

    async fn upsert(&self, record: &ShortenedUrlRecord) -> StorageResult<()> {
        sqlx::query(
            r#"
            INSERT INTO urls (short_url, long_url, provider, favorite, title, description, created_at, qr_png)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(short_url) DO UPDATE SET
                long_url = excluded.long_url,
                provider = excluded.provider,
                favorite = excluded.favorite,
                title = excluded.title,
                description = excluded.description,
                created_at = excluded.created_at,
                qr_png = COALESCE(excluded.qr_png, urls.qr_png)
            "#,
        )
        .bind(&record.short_url)
        .bind(&record.long_url)
        .bind(&record.provider)
        .bind(record.favorite)
        .bind(&record.title)
        .bind(&record.description)
        .bind(record.created_at)
        .bind(&record.qr_png)
        .execute(self.pool.as_ref())
        .await?;

        Ok(())
    }

    async fn find(&self, short_url: &str) -> StorageResult<Option<ShortenedUrlRecord>> {
        let record = sqlx::query_as::<_, ShortenedUrlRecord>(&format!(
            "SELECT {COLUMNS} FROM urls WHERE short_url = ?"
        ))
        .bind(short_url)
        .fetch_optional(self.pool.as_ref())
        .await?;

        Ok(record)
    }

    async fn find_by_long_url(
        &self,
        provider: &str,
        long_url: &str,
    ) -> StorageResult<Vec<ShortenedUrlRecord>> {
        let records = sqlx::query_as::<_, ShortenedUrlRecord>(&format!(
            r#"
            SELECT {COLUMNS}
            FROM urls
            WHERE provider = ? AND rtrim(long_url, '/') = ?
            ORDER BY created_at DESC, short_url
            "#
        ))
        .bind(provider)
        .bind(long_url.trim_end_matches('/'))
        .fetch_all(self.pool.as_ref())
        .await?;

        Ok(records)
    }

    async fn list(
        &self,
        limit: i64,
        offset: i64,
        favorites_only: bool,
    ) -> StorageResult<Vec<ShortenedUrlRecord>> {
        let (limit, offset) = page_bounds(limit, offset);
        let filter = if favorites_only {
            "WHERE favorite = 1"
        } else {
            ""
        };
        let records = sqlx::query_as::<_, ShortenedUrlRecord>(&format!(
            r#"
            SELECT {COLUMNS}
            FROM urls
            {filter}
            ORDER BY created_at DESC, short_url
            LIMIT ? OFFSET ?
            "#
        ))
        .bind(limit as i64)
        .bind(offset as i64)
        .fetch_all(self.pool.as_ref())
        .await?;

        Ok(records)
    }

    async fn search(&self, query: &str, limit: i64) -> StorageResult<Vec<ShortenedUrlRecord>> {
        // SQLite's LIKE folds ASCII only, so matching happens here.
        let (limit, _) = page_bounds(limit, 0);
        let needle = search_needle(query);
        let records = sqlx::query_as::<_, ShortenedUrlRecord>(&format!(
            "SELECT {COLUMNS} FROM urls ORDER BY created_at DESC, short_url"
        ))
        .fetch_all(self.pool.as_ref())
        .await?;

        Ok(records
            .into_iter()
            .filter(|record| matches_query(record, &needle))
            .take(limit)
            .collect())
    }

    async fn set_favorite(&self, short_url: &str, favorite: bool) -> StorageResult<bool> {
        let result = sqlx::query("UPDATE urls SET favorite = ? WHERE short_url = ?")
            .bind(favorite)
            .bind(short_url)
            .execute(self.pool.as_ref())
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete(&self, short_url: &str) -> StorageResult<bool> {
        let result = sqlx::query("DELETE FROM urls WHERE short_url = ?")
            .bind(short_url)
            .execute(self.pool.as_ref())
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
