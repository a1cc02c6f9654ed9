use chrono::Utc;
use std::sync::Arc;
use thiserror::Error;
use tracing::info;

use crate::engine::OrchestrationEngine;
use crate::models::{Failure, ShortenOutcome, ShortenRequest, ShortenedUrlRecord};
use crate::providers;
use crate::qr::QrEncoder;
use crate::storage::{Storage, StorageError};

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("{0}")]
    Provider(Failure),
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error("no stored short URL {0}")]
    NotFound(String),
}

impl From<Failure> for ServiceError {
    fn from(failure: Failure) -> Self {
        ServiceError::Provider(failure)
    }
}

/// Shortens through the engine and keeps the local history in step.
pub struct ShortenService {
    engine: OrchestrationEngine,
    storage: Arc<dyn Storage>,
    qr: Arc<dyn QrEncoder>,
    icon: Option<Vec<u8>>,
}

impl ShortenService {
    pub fn new(
        engine: OrchestrationEngine,
        storage: Arc<dyn Storage>,
        qr: Arc<dyn QrEncoder>,
    ) -> Self {
        Self {
            engine,
            storage,
            qr,
            icon: None,
        }
    }

    /// Image handed to the QR encoder with every short URL.
    pub fn with_icon(mut self, icon: Vec<u8>) -> Self {
        self.icon = Some(icon);
        self
    }

    pub fn engine(&self) -> &OrchestrationEngine {
        &self.engine
    }

    /// Runs the shorten flow and stores the result. Re-shortening into a
    /// short URL that is already stored keeps its favorite flag, notes and
    /// creation time unless the request overrides them.
    pub async fn shorten(
        &self,
        request: &ShortenRequest,
    ) -> Result<ShortenedUrlRecord, ServiceError> {
        let short_url = match self.engine.create(request).await {
            ShortenOutcome::Success { short_url, .. } => short_url,
            ShortenOutcome::Failure(failure) => return Err(ServiceError::Provider(failure)),
        };

        let existing = self.storage.find(&short_url).await?;
        let qr_png = self.qr.encode(&short_url, self.icon.as_deref());
        let record = ShortenedUrlRecord {
            long_url: request.provider.sanitizer.canonical(&request.long_url),
            provider: request.provider.name.to_string(),
            favorite: request.favorite || existing.as_ref().is_some_and(|r| r.favorite),
            title: request
                .title
                .clone()
                .or_else(|| existing.as_ref().and_then(|r| r.title.clone())),
            description: request
                .description
                .clone()
                .or_else(|| existing.as_ref().and_then(|r| r.description.clone())),
            created_at: existing
                .as_ref()
                .map_or_else(|| Utc::now().timestamp(), |r| r.created_at),
            qr_png: qr_png.or_else(|| existing.and_then(|r| r.qr_png)),
            short_url,
        };

        self.storage.upsert(&record).await?;
        info!("stored {} -> {}", record.short_url, record.long_url);
        Ok(record)
    }

    /// Click count for a stored short URL, asked of the provider that made it.
    pub async fn refresh_clicks(&self, short_url: &str) -> Result<u64, ServiceError> {
        let record = self
            .storage
            .find(short_url)
            .await?
            .ok_or_else(|| ServiceError::NotFound(short_url.to_string()))?;
        let provider = providers::by_identity(&record.provider);
        Ok(self.engine.click_count(provider, &record.short_url).await?)
    }

    pub async fn history(
        &self,
        limit: i64,
        offset: i64,
        favorites_only: bool,
    ) -> Result<Vec<ShortenedUrlRecord>, ServiceError> {
        Ok(self.storage.list(limit, offset, favorites_only).await?)
    }

    pub async fn search(
        &self,
        query: &str,
        limit: i64,
    ) -> Result<Vec<ShortenedUrlRecord>, ServiceError> {
        Ok(self.storage.search(query, limit).await?)
    }

    pub async fn set_favorite(&self, short_url: &str, favorite: bool) -> Result<(), ServiceError> {
        if self.storage.set_favorite(short_url, favorite).await? {
            Ok(())
        } else {
            Err(ServiceError::NotFound(short_url.to_string()))
        }
    }

    pub async fn delete(&self, short_url: &str) -> Result<(), ServiceError> {
        if self.storage.delete(short_url).await? {
            Ok(())
        } else {
            Err(ServiceError::NotFound(short_url.to_string()))
        }
    }
}
