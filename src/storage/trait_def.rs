use crate::models::ShortenedUrlRecord;
use anyhow::Result;
use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type StorageResult<T> = Result<T, StorageError>;

#[async_trait]
pub trait Storage: Send + Sync {
    /// Initialize the storage (create tables and indexes)
    async fn init(&self) -> Result<()>;

    /// Insert a record, replacing any earlier record with the same short URL
    async fn upsert(&self, record: &ShortenedUrlRecord) -> StorageResult<()>;

    async fn find(&self, short_url: &str) -> StorageResult<Option<ShortenedUrlRecord>>;

    /// Records created through `provider` for `long_url`, newest first.
    /// Trailing '/' characters on either side are ignored.
    async fn find_by_long_url(
        &self,
        provider: &str,
        long_url: &str,
    ) -> StorageResult<Vec<ShortenedUrlRecord>>;

    /// Newest first. Negative `limit` or `offset` count as zero.
    async fn list(
        &self,
        limit: i64,
        offset: i64,
        favorites_only: bool,
    ) -> StorageResult<Vec<ShortenedUrlRecord>>;

    /// Case-insensitive (Unicode) substring match over short URL, long URL,
    /// title and description, newest first. A negative `limit` counts as zero.
    async fn search(&self, query: &str, limit: i64) -> StorageResult<Vec<ShortenedUrlRecord>>;

    /// Returns false when no record has that short URL
    async fn set_favorite(&self, short_url: &str, favorite: bool) -> StorageResult<bool>;

    async fn delete(&self, short_url: &str) -> StorageResult<bool>;
}

/// Long URLs are compared without their trailing '/'.
pub fn same_long_url(a: &str, b: &str) -> bool {
    a.trim_end_matches('/') == b.trim_end_matches('/')
}

/// `limit` and `offset` as row counts.
pub fn page_bounds(limit: i64, offset: i64) -> (usize, usize) {
    (
        usize::try_from(limit).unwrap_or(0),
        usize::try_from(offset).unwrap_or(0),
    )
}

/// Search text as compared by [`matches_query`].
pub fn search_needle(query: &str) -> String {
    query.trim().to_lowercase()
}

/// Whether any text column of `record` contains `needle`, ignoring case.
pub fn matches_query(record: &ShortenedUrlRecord, needle: &str) -> bool {
    let matches = |text: &str| text.to_lowercase().contains(needle);
    matches(&record.short_url)
        || matches(&record.long_url)
        || record.title.as_deref().is_some_and(matches)
        || record.description.as_deref().is_some_and(matches)
}
