use crate::models::ShortenedUrlRecord;
use crate::storage::{
    matches_query, page_bounds, same_long_url, search_needle, Storage, StorageResult,
};
use anyhow::Result;
use async_trait::async_trait;
use dashmap::DashMap;
use std::cmp::Ordering;

/// Process-local storage keyed by short URL, for tests and `--ephemeral` runs.
#[derive(Default)]
pub struct MemoryStorage {
    records: DashMap<String, ShortenedUrlRecord>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    fn collect<F>(&self, keep: F) -> Vec<ShortenedUrlRecord>
    where
        F: Fn(&ShortenedUrlRecord) -> bool,
    {
        let mut records: Vec<_> = self
            .records
            .iter()
            .filter(|entry| keep(entry.value()))
            .map(|entry| entry.value().clone())
            .collect();
        records.sort_by(newest_first);
        records
    }
}

fn newest_first(a: &ShortenedUrlRecord, b: &ShortenedUrlRecord) -> Ordering {
    b.created_at
        .cmp(&a.created_at)
        .then_with(|| a.short_url.cmp(&b.short_url))
}

fn page(records: Vec<ShortenedUrlRecord>, limit: i64, offset: i64) -> Vec<ShortenedUrlRecord> {
    let (limit, offset) = page_bounds(limit, offset);
    records.into_iter().skip(offset).take(limit).collect()
}

#[async_trait]
impl Storage for MemoryStorage {
    async fn init(&self) -> Result<()> {
        Ok(())
    }

    async fn upsert(&self, record: &ShortenedUrlRecord) -> StorageResult<()> {
        let mut record = record.clone();
        if let Some(existing) = self.records.get(&record.short_url) {
            if record.qr_png.is_none() {
                record.qr_png = existing.qr_png.clone();
            }
        }
        self.records.insert(record.short_url.clone(), record);
        Ok(())
    }

    async fn find(&self, short_url: &str) -> StorageResult<Option<ShortenedUrlRecord>> {
        Ok(self.records.get(short_url).map(|entry| entry.value().clone()))
    }

    async fn find_by_long_url(
        &self,
        provider: &str,
        long_url: &str,
    ) -> StorageResult<Vec<ShortenedUrlRecord>> {
        Ok(self.collect(|record| {
            record.provider == provider && same_long_url(&record.long_url, long_url)
        }))
    }

    async fn list(
        &self,
        limit: i64,
        offset: i64,
        favorites_only: bool,
    ) -> StorageResult<Vec<ShortenedUrlRecord>> {
        let records = self.collect(|record| !favorites_only || record.favorite);
        Ok(page(records, limit, offset))
    }

    async fn search(&self, query: &str, limit: i64) -> StorageResult<Vec<ShortenedUrlRecord>> {
        let needle = search_needle(query);
        let records = self.collect(|record| matches_query(record, &needle));
        Ok(page(records, limit, 0))
    }

    async fn set_favorite(&self, short_url: &str, favorite: bool) -> StorageResult<bool> {
        match self.records.get_mut(short_url) {
            Some(mut entry) => {
                entry.favorite = favorite;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete(&self, short_url: &str) -> StorageResult<bool> {
        Ok(self.records.remove(short_url).is_some())
    }
}
