//! Drives one shorten action from user input to a [`ShortenOutcome`].
//!
//! ```text
//! Idle -> Validating -> (CheckingAlias) -> Creating -> Succeeded | Failed
//! ```
//!
//! The engine owns no mutable state. Every call is independent, and dropping
//! the returned future abandons the operation.

use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::connectivity::Connectivity;
use crate::models::{alias_of, AliasCheck, ErrorKind, Failure, ShortenOutcome, ShortenRequest};
use crate::protocol::{self, RawResponse};
use crate::providers::{validate_alias, Provider};
use crate::storage::{same_long_url, Storage};
use crate::transport::{HttpRequest, HttpTransport};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Idle,
    Validating,
    CheckingAlias,
    Creating,
    Succeeded,
    Failed,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Idle => "idle",
            Stage::Validating => "validating",
            Stage::CheckingAlias => "checking-alias",
            Stage::Creating => "creating",
            Stage::Succeeded => "succeeded",
            Stage::Failed => "failed",
        };
        f.write_str(name)
    }
}

pub struct OrchestrationEngine {
    transport: Arc<dyn HttpTransport>,
    connectivity: Arc<dyn Connectivity>,
    /// Consulted for local dedup only; the engine never writes to it.
    storage: Option<Arc<dyn Storage>>,
}

impl OrchestrationEngine {
    pub fn new(transport: Arc<dyn HttpTransport>, connectivity: Arc<dyn Connectivity>) -> Self {
        Self {
            transport,
            connectivity,
            storage: None,
        }
    }

    pub fn with_storage(mut self, storage: Arc<dyn Storage>) -> Self {
        self.storage = Some(storage);
        self
    }

    /// Runs the full shorten flow. Never panics on provider input and never
    /// surfaces a transport error other than as a [`ShortenOutcome::Failure`].
    pub async fn create(&self, request: &ShortenRequest) -> ShortenOutcome {
        let provider = request.provider;
        let alias = request.requested_alias();
        enter(provider, Stage::Idle);

        enter(provider, Stage::Validating);
        if let Some(alias) = alias {
            if let Err(error) = validate_alias(provider, alias) {
                return finish(provider, ShortenOutcome::Failure(error.into()));
            }
        }
        if !provider.enabled {
            return finish(
                provider,
                ShortenOutcome::failure(ErrorKind::ServiceTemporarilyUnavailable),
            );
        }
        if !self.connectivity.has_usable_network().await {
            return finish(provider, ShortenOutcome::failure(ErrorKind::ServiceOffline));
        }

        let long_url = provider.sanitizer.canonical(&request.long_url);
        if let Some(short_url) = self.known_short_url(provider, &long_url, alias).await {
            info!(provider = provider.name, "{} was already shortened locally", long_url);
            return finish(provider, ShortenOutcome::success(short_url));
        }

        if let (Some(alias), Some(check)) = (alias, provider.check.as_ref()) {
            enter(provider, Stage::CheckingAlias);
            if let Some(http) = protocol::build_check(provider, alias) {
                let response = self.send(&http).await;
                match protocol::interpret_check(provider, check, &response, alias) {
                    AliasCheck::Taken {
                        short_url,
                        long_url: existing,
                    } => {
                        return if same_long_url(&existing, &long_url) {
                            debug!(provider = provider.name, "alias {} already points here", alias);
                            finish(provider, ShortenOutcome::success(short_url))
                        } else {
                            finish(provider, ShortenOutcome::failure(ErrorKind::AliasAlreadyExists))
                        };
                    }
                    AliasCheck::Available => {}
                    AliasCheck::Inconclusive(failure) => {
                        debug!(
                            provider = provider.name,
                            "alias check inconclusive ({}), creating anyway", failure
                        );
                    }
                }
            }
        }

        enter(provider, Stage::Creating);
        let http = protocol::build_create(provider, &request.long_url, alias);
        let response = self.send(&http).await;
        finish(provider, protocol::interpret_create(provider, &response, alias))
    }

    /// Asks the provider whether `alias` is already bound.
    pub async fn check_alias(&self, provider: &'static Provider, alias: &str) -> AliasCheck {
        let alias = alias.trim();
        let Some(check) = provider.check.as_ref() else {
            return AliasCheck::Inconclusive(unsupported(provider, "check aliases"));
        };
        if let Err(error) = validate_alias(provider, alias) {
            return AliasCheck::Inconclusive(error.into());
        }
        if !self.connectivity.has_usable_network().await {
            return AliasCheck::Inconclusive(Failure::new(ErrorKind::ServiceOffline));
        }
        let Some(http) = protocol::build_check(provider, alias) else {
            return AliasCheck::Inconclusive(unsupported(provider, "check aliases"));
        };
        let response = self.send(&http).await;
        protocol::interpret_check(provider, check, &response, alias)
    }

    /// Fetches the click count of a short URL created through `provider`.
    pub async fn click_count(
        &self,
        provider: &'static Provider,
        short_url: &str,
    ) -> Result<u64, Failure> {
        let clicks = provider
            .clicks
            .as_ref()
            .ok_or_else(|| unsupported(provider, "report click counts"))?;
        if !self.connectivity.has_usable_network().await {
            return Err(Failure::new(ErrorKind::ServiceOffline));
        }
        let http = protocol::build_clicks(provider, short_url)
            .ok_or_else(|| unsupported(provider, "report click counts"))?;
        let response = self.send(&http).await;
        let count = protocol::interpret_clicks(clicks, &response);
        if let Ok(count) = count {
            debug!(provider = provider.name, "{} has {} clicks", short_url, count);
        }
        count
    }

    async fn send(&self, request: &HttpRequest) -> RawResponse {
        self.transport.execute(request).await
    }

    /// Short URL of a stored record for the same provider and long URL,
    /// restricted to the requested alias when there is one.
    async fn known_short_url(
        &self,
        provider: &Provider,
        long_url: &str,
        alias: Option<&str>,
    ) -> Option<String> {
        let storage = self.storage.as_ref()?;
        let records = match storage.find_by_long_url(provider.name, long_url).await {
            Ok(records) => records,
            Err(e) => {
                warn!("local lookup for {} failed: {}", long_url, e);
                return None;
            }
        };
        records
            .into_iter()
            .find(|record| alias.map_or(true, |alias| alias_of(&record.short_url) == alias))
            .map(|record| record.short_url)
    }
}

fn enter(provider: &Provider, stage: Stage) {
    debug!(provider = provider.name, %stage, "stage");
}

fn finish(provider: &Provider, outcome: ShortenOutcome) -> ShortenOutcome {
    match &outcome {
        ShortenOutcome::Success { short_url, .. } => {
            info!(provider = provider.name, stage = %Stage::Succeeded, "{}", short_url);
        }
        ShortenOutcome::Failure(failure) => {
            warn!(provider = provider.name, stage = %Stage::Failed, "{}", failure);
        }
    }
    outcome
}

fn unsupported(provider: &Provider, what: &str) -> Failure {
    Failure::with_detail(
        ErrorKind::Unknown(None),
        &format!("{} cannot {what}", provider.name),
    )
}
