use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::providers::Provider;

/// A finished short link as kept in local storage.
///
/// `short_url` is the primary key; storing the same short URL twice
/// replaces the earlier record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct ShortenedUrlRecord {
    pub short_url: String,
    pub long_url: String,
    pub provider: String,
    pub favorite: bool,
    pub title: Option<String>,
    pub description: Option<String>,
    pub created_at: i64,
    #[serde(skip)]
    pub qr_png: Option<Vec<u8>>,
}

/// One user-initiated shorten action.
#[derive(Debug, Clone)]
pub struct ShortenRequest {
    pub provider: &'static Provider,
    pub long_url: String,
    pub alias: Option<String>,
    pub favorite: bool,
    pub title: Option<String>,
    pub description: Option<String>,
}

impl ShortenRequest {
    pub fn new(provider: &'static Provider, long_url: impl Into<String>) -> Self {
        Self {
            provider,
            long_url: long_url.into(),
            alias: None,
            favorite: false,
            title: None,
            description: None,
        }
    }

    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    /// The requested alias, or `None` when blank.
    pub fn requested_alias(&self) -> Option<&str> {
        self.alias
            .as_deref()
            .map(str::trim)
            .filter(|alias| !alias.is_empty())
    }
}
