use serde::{Deserialize, Serialize};
use std::fmt;

/// Provider-agnostic classification of a failed operation.
///
/// Every provider maps its own status codes and error bodies into this set,
/// so callers can render any failure without knowing which service produced
/// it. `Custom` carries the raw provider text for display only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorKind {
    InvalidUrl,
    InvalidAlias,
    AliasAlreadyExists,
    UrlAlreadyExistsWithDifferentAlias,
    RateLimitExceeded,
    ServiceTemporarilyUnavailable,
    /// No usable network connection.
    ServiceOffline,
    DomainNotAllowed,
    HumanVerificationRequired,
    InternalServerError,
    Unknown(Option<u16>),
    Custom { status: u16, message: String },
}

impl ErrorKind {
    /// Whether picking another provider could plausibly succeed.
    ///
    /// Failures caused by the user's input (a malformed URL, a taken alias)
    /// will fail the same way elsewhere or need the input changed first.
    pub fn suggests_fallback(&self) -> bool {
        match self {
            ErrorKind::InvalidUrl
            | ErrorKind::InvalidAlias
            | ErrorKind::AliasAlreadyExists
            | ErrorKind::UrlAlreadyExistsWithDifferentAlias
            | ErrorKind::ServiceOffline => false,
            ErrorKind::RateLimitExceeded
            | ErrorKind::ServiceTemporarilyUnavailable
            | ErrorKind::DomainNotAllowed
            | ErrorKind::HumanVerificationRequired
            | ErrorKind::InternalServerError
            | ErrorKind::Unknown(_)
            | ErrorKind::Custom { .. } => true,
        }
    }

    fn template(&self) -> &'static str {
        match self {
            ErrorKind::InvalidUrl => "The URL is not valid for this service",
            ErrorKind::InvalidAlias => "The alias is not valid for this service",
            ErrorKind::AliasAlreadyExists => "The alias is already in use",
            ErrorKind::UrlAlreadyExistsWithDifferentAlias => {
                "This URL was already shortened with a different alias"
            }
            ErrorKind::RateLimitExceeded => "Too many requests, try again later",
            ErrorKind::ServiceTemporarilyUnavailable => "The service is temporarily unavailable",
            ErrorKind::ServiceOffline => "No network connection",
            ErrorKind::DomainNotAllowed => "This service does not accept links to that domain",
            ErrorKind::HumanVerificationRequired => {
                "The service requires a human verification step"
            }
            ErrorKind::InternalServerError => "The service reported an internal error",
            ErrorKind::Unknown(_) => "Unknown error",
            ErrorKind::Custom { .. } => "The service rejected the request",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::Unknown(Some(status)) => write!(f, "{} (HTTP {status})", self.template()),
            ErrorKind::Custom { status, .. } => write!(f, "{} (HTTP {status})", self.template()),
            other => f.write_str(other.template()),
        }
    }
}

/// A normalized failure ready to be shown to the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Failure {
    pub kind: ErrorKind,
    pub message: String,
    pub retryable_with_fallback: bool,
}

impl Failure {
    pub fn new(kind: ErrorKind) -> Self {
        let message = match &kind {
            ErrorKind::Custom { message, .. } if !message.trim().is_empty() => {
                format!("{kind}: {}", clip(message))
            }
            _ => kind.to_string(),
        };
        Self::with_message(kind, message)
    }

    /// Builds a failure and appends provider text for the kinds that are
    /// too vague on their own.
    pub fn with_detail(kind: ErrorKind, detail: &str) -> Self {
        let detail = detail.trim();
        match kind {
            ErrorKind::Unknown(_) | ErrorKind::Custom { .. } if !detail.is_empty() => {
                let message = format!("{kind}: {}", clip(detail));
                Self::with_message(kind, message)
            }
            _ => Self::new(kind),
        }
    }

    fn with_message(kind: ErrorKind, message: String) -> Self {
        let retryable_with_fallback = kind.suggests_fallback();
        Self {
            kind,
            message,
            retryable_with_fallback,
        }
    }
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// Long bodies (HTML error pages) are cut down before they reach the user.
fn clip(text: &str) -> String {
    const MAX_CHARS: usize = 200;
    let text = text.trim();
    if text.chars().count() <= MAX_CHARS {
        return text.to_string();
    }
    let mut clipped: String = text.chars().take(MAX_CHARS).collect();
    clipped.push('…');
    clipped
}

/// Result of a single shorten operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ShortenOutcome {
    Success { short_url: String, alias: String },
    Failure(Failure),
}

impl ShortenOutcome {
    pub fn success(short_url: impl Into<String>) -> Self {
        let short_url = short_url.into();
        let alias = alias_of(&short_url);
        ShortenOutcome::Success { short_url, alias }
    }

    pub fn failure(kind: ErrorKind) -> Self {
        ShortenOutcome::Failure(Failure::new(kind))
    }

    pub fn is_success(&self) -> bool {
        matches!(self, ShortenOutcome::Success { .. })
    }

    pub fn kind(&self) -> Option<&ErrorKind> {
        match self {
            ShortenOutcome::Success { .. } => None,
            ShortenOutcome::Failure(failure) => Some(&failure.kind),
        }
    }
}

/// Outcome of probing whether an alias is already bound on the remote side.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AliasCheck {
    /// The provider reported the alias as unknown.
    Available,
    /// The alias exists and points at `long_url`.
    Taken { short_url: String, long_url: String },
    /// The check could not tell either way.
    Inconclusive(Failure),
}

/// The alias part of a short URL: its last non-empty path segment.
pub fn alias_of(short_url: &str) -> String {
    if let Ok(parsed) = url::Url::parse(short_url) {
        if let Some(segment) = parsed
            .path_segments()
            .and_then(|segments| segments.filter(|s| !s.is_empty()).last())
        {
            return percent_encoding::percent_decode_str(segment)
                .decode_utf8_lossy()
                .into_owned();
        }
    }
    short_url
        .trim_end_matches('/')
        .rsplit('/')
        .next()
        .unwrap_or_default()
        .to_string()
}
