use dashmap::DashMap;
use regex::Regex;
use std::sync::LazyLock;
use thiserror::Error;
use tracing::error;

use super::Provider;
use crate::models::{ErrorKind, Failure};

static CHARACTER_REGEXES: LazyLock<DashMap<&'static str, Regex>> = LazyLock::new(DashMap::new);

/// Client-side alias rules of a provider.
///
/// Services validate again on their side, so passing these checks does not
/// guarantee the alias will be accepted.
#[derive(Debug, Clone, Copy)]
pub struct AliasConstraint {
    pub min_length: usize,
    /// `None` means the service documents no upper bound.
    pub max_length: Option<usize>,
    /// A regex character class matching one allowed character.
    pub pattern: &'static str,
    /// Human readable form of `pattern`.
    pub allowed: &'static str,
}

impl AliasConstraint {
    pub const fn new(
        min_length: usize,
        max_length: Option<usize>,
        pattern: &'static str,
        allowed: &'static str,
    ) -> Self {
        Self {
            min_length,
            max_length,
            pattern,
            allowed,
        }
    }

    /// `pattern` anchored to a single character, compiled once per pattern.
    pub fn character_regex(&self) -> Result<Regex, regex::Error> {
        if let Some(regex) = CHARACTER_REGEXES.get(self.pattern) {
            return Ok(regex.clone());
        }
        let regex = Regex::new(&format!("^{}$", self.pattern))?;
        CHARACTER_REGEXES.insert(self.pattern, regex.clone());
        Ok(regex)
    }

    pub fn validate(&self, alias: &str) -> Result<(), AliasError> {
        let length = alias.chars().count();
        if length < self.min_length {
            return Err(AliasError::TooShort {
                min: self.min_length,
            });
        }
        if let Some(max) = self.max_length {
            if length > max {
                return Err(AliasError::TooLong { max });
            }
        }

        let regex = self.character_regex().map_err(|e| {
            error!("alias pattern {} does not compile: {}", self.pattern, e);
            AliasError::InvalidCharacters {
                character: alias.chars().next().unwrap_or(' '),
                allowed: self.allowed,
            }
        })?;

        let mut buffer = [0u8; 4];
        match alias
            .chars()
            .find(|c| !regex.is_match(c.encode_utf8(&mut buffer)))
        {
            Some(character) => Err(AliasError::InvalidCharacters {
                character,
                allowed: self.allowed,
            }),
            None => Ok(()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AliasError {
    #[error("alias must be at least {min} characters long")]
    TooShort { min: usize },
    #[error("alias must be at most {max} characters long")]
    TooLong { max: usize },
    #[error("alias contains '{character}', allowed characters are {allowed}")]
    InvalidCharacters {
        character: char,
        allowed: &'static str,
    },
    #[error("this service does not support custom aliases")]
    NotSupported,
}

/// Checks `alias` against the provider's rules before any request is made.
pub fn validate_alias(provider: &Provider, alias: &str) -> Result<(), AliasError> {
    match &provider.alias {
        None if alias.is_empty() => Ok(()),
        None => Err(AliasError::NotSupported),
        Some(constraint) => constraint.validate(alias),
    }
}

impl From<AliasError> for Failure {
    fn from(error: AliasError) -> Self {
        let kind = ErrorKind::InvalidAlias;
        Failure {
            message: format!("{kind}: {error}"),
            retryable_with_fallback: kind.suggests_fallback(),
            kind,
        }
    }
}
