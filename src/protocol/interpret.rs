use serde_json::Value;
use tracing::debug;

use super::extract;
use crate::models::{alias_of, AliasCheck, ErrorKind, Failure, ShortenOutcome};
use crate::providers::{CheckSpec, ClickSpec, ErrorTable, LongUrlSource, Provider};
use crate::transport::{HttpResponse, TransportError};

/// What came back from the transport for one request.
pub type RawResponse = Result<HttpResponse, TransportError>;

/// Turns the response to a create request into an outcome.
///
/// Pure function of its inputs: the same response always yields the same
/// outcome.
pub fn interpret_create(
    provider: &Provider,
    response: &RawResponse,
    requested_alias: Option<&str>,
) -> ShortenOutcome {
    let response = match response {
        Ok(response) => response,
        Err(error) => return ShortenOutcome::Failure(transport_failure(error)),
    };
    let spec = &provider.response;

    if let Some(kind) = status_kind(spec.errors.statuses, response.status) {
        return ShortenOutcome::Failure(Failure::new(kind));
    }

    if let Some(short_url) = extract::short_url(&spec.shape, response) {
        if spec.alias_echo {
            if let Some(alias) = requested_alias.filter(|alias| !alias.is_empty()) {
                if alias_of(&short_url) != alias {
                    debug!(
                        provider = provider.name,
                        "{} came back instead of the requested alias", short_url
                    );
                    return ShortenOutcome::failure(ErrorKind::AliasAlreadyExists);
                }
            }
        }
        return ShortenOutcome::success(short_url);
    }

    ShortenOutcome::Failure(classify(&spec.errors, response))
}

/// Turns the response to an alias check into an [`AliasCheck`].
pub fn interpret_check(
    provider: &Provider,
    check: &CheckSpec,
    response: &RawResponse,
    alias: &str,
) -> AliasCheck {
    let response = match response {
        Ok(response) => response,
        Err(error) => return AliasCheck::Inconclusive(transport_failure(error)),
    };

    if check.not_found_statuses.contains(&response.status) {
        return AliasCheck::Available;
    }

    let json = serde_json::from_slice::<Value>(&response.body).ok();
    if let Some(object) = json.as_ref().and_then(Value::as_object) {
        if check.not_found_keys.iter().any(|key| object.contains_key(*key)) {
            return AliasCheck::Available;
        }
    }

    if response.is_success() {
        let long_url = match check.long_url {
            LongUrlSource::PlainText => {
                let text = response.text();
                let text = text.trim();
                (!text.is_empty() && !text.contains(char::is_whitespace)).then(|| text.to_string())
            }
            LongUrlSource::Json(path) => json.as_ref().and_then(|json| extract::string_at(json, path)),
        };
        if let Some(long_url) = long_url {
            return AliasCheck::Taken {
                short_url: check.short_url.replace("{alias}", alias),
                long_url,
            };
        }
    }

    if let Some(kind) = status_kind(provider.response.errors.statuses, response.status) {
        return AliasCheck::Inconclusive(Failure::new(kind));
    }
    AliasCheck::Inconclusive(classify(&provider.response.errors, response))
}

/// Turns the response to a click-count request into a count.
pub fn interpret_clicks(clicks: &ClickSpec, response: &RawResponse) -> Result<u64, Failure> {
    let response = match response {
        Ok(response) => response,
        Err(error) => return Err(transport_failure(error)),
    };

    if let Some(kind) = status_kind(clicks.errors.statuses, response.status) {
        return Err(Failure::new(kind));
    }

    if response.is_success() {
        let count = serde_json::from_slice::<Value>(&response.body)
            .ok()
            .and_then(|json| extract::count_at(&json, clicks.count_path));
        if let Some(count) = count {
            return Ok(count);
        }
    }

    Err(classify(&clicks.errors, response))
}

/// Failure for a request that never produced a response.
pub fn transport_failure(error: &TransportError) -> Failure {
    match error {
        TransportError::Connect(_) => Failure::new(ErrorKind::ServiceOffline),
        TransportError::Timeout => Failure::with_detail(ErrorKind::Unknown(None), "request timed out"),
        TransportError::Other(message) => Failure::with_detail(ErrorKind::Unknown(None), message),
    }
}

fn status_kind(table: &[(u16, ErrorKind)], status: u16) -> Option<ErrorKind> {
    table
        .iter()
        .find(|(code, _)| *code == status)
        .map(|(_, kind)| kind.clone())
}

/// Maps a response that did not yield a value through the provider's table.
fn classify(errors: &ErrorTable, response: &HttpResponse) -> Failure {
    let body = response.text();
    let json = serde_json::from_str::<Value>(&body).ok();
    let detail = json
        .as_ref()
        .filter(|_| !errors.message_path.is_empty())
        .and_then(|json| extract::string_at(json, errors.message_path))
        .unwrap_or_else(|| body.trim().to_string());

    let lower = body.to_lowercase();
    if let Some((_, kind)) = errors.phrases.iter().find(|(phrase, _)| lower.contains(phrase)) {
        return Failure::with_detail(kind.clone(), &detail);
    }

    if let Some(json) = json.as_ref() {
        if let Some(codes) = errors.json_codes {
            if let Some(code) = extract::code_at(json, codes.path) {
                if let Some((_, kind)) = codes.codes.iter().find(|(known, _)| *known == code) {
                    return Failure::with_detail(kind.clone(), &detail);
                }
            }
        }
        if let Some(object) = json.as_object() {
            if let Some((key, kind)) = errors
                .json_keys
                .iter()
                .find(|(key, _)| object.contains_key(*key))
            {
                let detail = object
                    .get(*key)
                    .and_then(Value::as_str)
                    .map(str::to_string)
                    .unwrap_or(detail);
                return Failure::with_detail(kind.clone(), &detail);
            }
        }
    }

    if let Some(kind) = status_kind(errors.status_hints, response.status) {
        return Failure::with_detail(kind, &detail);
    }

    if response.is_success() {
        Failure::with_detail(ErrorKind::Unknown(Some(response.status)), &detail)
    } else {
        Failure::new(ErrorKind::Custom {
            status: response.status,
            message: detail,
        })
    }
}
