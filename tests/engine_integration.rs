//! Orchestration engine integration tests
//!
//! Every test drives the engine against a scripted transport and asserts on
//! both the outcome and the exact number of requests that went out.

mod common;

use common::{Offline, Online, ScriptedTransport};
use magpie::engine::OrchestrationEngine;
use magpie::models::{AliasCheck, ErrorKind, ShortenOutcome, ShortenRequest, ShortenedUrlRecord};
use magpie::providers;
use magpie::storage::{MemoryStorage, Storage};
use magpie::transport::{HttpResponse, TransportError};
use std::sync::Arc;

fn engine(transport: &Arc<ScriptedTransport>) -> OrchestrationEngine {
    OrchestrationEngine::new(transport.clone(), Arc::new(Online))
}

fn request(provider: &str, long_url: &str, alias: &str) -> ShortenRequest {
    ShortenRequest::new(providers::find(provider).unwrap(), long_url).with_alias(alias)
}

/// da.gd stand-in: `coshorten` answers with `check`, creation always succeeds.
fn dagd(check: HttpResponse) -> Arc<ScriptedTransport> {
    Arc::new(ScriptedTransport::new(move |request| {
        if request.url.contains("/coshorten/") {
            Ok(check.clone())
        } else {
            Ok(HttpResponse::new(200, "https://da.gd/abc\n"))
        }
    }))
}

#[tokio::test]
async fn test_generated_alias_end_to_end() {
    let transport = Arc::new(ScriptedTransport::new(|_| {
        Ok(HttpResponse::new(200, "https://da.gd/abc123"))
    }));

    let outcome = engine(&transport)
        .create(&request("da.gd", "example.com", ""))
        .await;

    assert_eq!(outcome, ShortenOutcome::success("https://da.gd/abc123"));
    let requests = transport.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].url, "https://da.gd/s?url=https%3A%2F%2Fexample.com");
}

#[tokio::test]
async fn test_short_alias_fails_before_network() {
    let transport = Arc::new(ScriptedTransport::new(|_| {
        panic!("no request expected");
    }));

    let outcome = engine(&transport)
        .create(&request("v.gd", "https://example.com", "ab"))
        .await;

    let ShortenOutcome::Failure(failure) = outcome else {
        panic!("expected failure");
    };
    assert_eq!(failure.kind, ErrorKind::InvalidAlias);
    assert!(failure.message.contains("at least 5"));
    assert!(!failure.retryable_with_fallback);
    assert_eq!(transport.calls(), 0);
}

#[tokio::test]
async fn test_alias_on_aliasless_provider_is_rejected() {
    let transport = Arc::new(ScriptedTransport::new(|_| {
        Ok(HttpResponse::new(200, r#"{"id":"owo.vc/x"}"#))
    }));

    let outcome = engine(&transport)
        .create(&request("owo.vc", "https://example.com", "mine"))
        .await;

    assert_eq!(outcome.kind(), Some(&ErrorKind::InvalidAlias));
    assert_eq!(transport.calls(), 0);
}

#[tokio::test]
async fn test_offline_makes_no_calls() {
    let transport = Arc::new(ScriptedTransport::new(|_| {
        Ok(HttpResponse::new(200, "https://da.gd/abc"))
    }));
    let engine = OrchestrationEngine::new(transport.clone(), Arc::new(Offline));

    let outcome = engine
        .create(&request("da.gd", "https://example.com", "abc"))
        .await;

    assert_eq!(outcome.kind(), Some(&ErrorKind::ServiceOffline));
    assert_eq!(transport.calls(), 0);

    let check = engine
        .check_alias(providers::find("da.gd").unwrap(), "abc")
        .await;
    assert!(matches!(check, AliasCheck::Inconclusive(f) if f.kind == ErrorKind::ServiceOffline));
    assert_eq!(transport.calls(), 0);
}

#[tokio::test]
async fn test_disabled_provider_is_refused() {
    let transport = Arc::new(ScriptedTransport::new(|_| {
        Ok(HttpResponse::new(201, ""))
    }));

    let outcome = engine(&transport)
        .create(&request("git.io", "https://github.com/rust-lang", ""))
        .await;

    assert_eq!(
        outcome.kind(),
        Some(&ErrorKind::ServiceTemporarilyUnavailable)
    );
    assert_eq!(transport.calls(), 0);
}

#[tokio::test]
async fn test_taken_alias_with_same_url_skips_create() {
    // Trailing slash differs on purpose.
    let transport = dagd(HttpResponse::new(200, "https://example.com/\n"));

    let outcome = engine(&transport)
        .create(&request("da.gd", "https://example.com", "abc"))
        .await;

    assert_eq!(outcome, ShortenOutcome::success("https://da.gd/abc"));
    assert_eq!(transport.calls_matching("/coshorten/"), 1);
    assert_eq!(transport.calls_matching("/s?"), 0);
}

#[tokio::test]
async fn test_taken_alias_with_other_url_fails() {
    let transport = dagd(HttpResponse::new(200, "https://elsewhere.example\n"));

    let outcome = engine(&transport)
        .create(&request("da.gd", "https://example.com", "abc"))
        .await;

    assert_eq!(outcome.kind(), Some(&ErrorKind::AliasAlreadyExists));
    assert_eq!(transport.calls(), 1);
}

#[tokio::test]
async fn test_missing_alias_creates_exactly_once() {
    let transport = dagd(HttpResponse::new(404, "No URL found"));

    let outcome = engine(&transport)
        .create(&request("da.gd", "https://example.com", "abc"))
        .await;

    assert!(outcome.is_success());
    assert_eq!(transport.calls_matching("/coshorten/"), 1);
    assert_eq!(transport.calls_matching("/s?"), 1);
    assert_eq!(transport.calls(), 2);
}

#[tokio::test]
async fn test_inconclusive_check_still_creates_once() {
    let transport = Arc::new(ScriptedTransport::new(|request| {
        if request.url.contains("/coshorten/") {
            Err(TransportError::Timeout)
        } else {
            Ok(HttpResponse::new(200, "https://da.gd/abc"))
        }
    }));

    let outcome = engine(&transport)
        .create(&request("da.gd", "https://example.com", "abc"))
        .await;

    assert!(outcome.is_success());
    assert_eq!(transport.calls(), 2);
}

#[tokio::test]
async fn test_providers_without_check_go_straight_to_create() {
    let transport = Arc::new(ScriptedTransport::new(|_| {
        Ok(HttpResponse::new(200, "https://tinyurl.com/myalias"))
    }));

    let outcome = engine(&transport)
        .create(&request("tinyurl.com", "example.com/?a=1&b=2", "myalias"))
        .await;

    assert_eq!(outcome, ShortenOutcome::success("https://tinyurl.com/myalias"));
    let requests = transport.requests();
    assert_eq!(requests.len(), 1);
    assert!(requests[0].url.ends_with("url=https://example.com/?a=1%26b=2"));
}

#[tokio::test]
async fn test_connect_failure_becomes_offline_outcome() {
    let transport = Arc::new(ScriptedTransport::new(|_| {
        Err(TransportError::Connect("dns error".into()))
    }));

    let outcome = engine(&transport)
        .create(&request("spoo.me", "https://example.com", ""))
        .await;

    let ShortenOutcome::Failure(failure) = outcome else {
        panic!("expected failure");
    };
    assert_eq!(failure.kind, ErrorKind::ServiceOffline);
    assert!(!failure.retryable_with_fallback);
}

#[tokio::test]
async fn test_rate_limit_is_retryable_elsewhere() {
    let transport = Arc::new(ScriptedTransport::new(|_| {
        Ok(HttpResponse::new(429, "Custom short URL already taken."))
    }));

    let outcome = engine(&transport)
        .create(&request("da.gd", "https://example.com", ""))
        .await;

    let ShortenOutcome::Failure(failure) = outcome else {
        panic!("expected failure");
    };
    assert_eq!(failure.kind, ErrorKind::RateLimitExceeded);
    assert!(failure.retryable_with_fallback);
}

fn stored(short_url: &str, long_url: &str) -> ShortenedUrlRecord {
    ShortenedUrlRecord {
        short_url: short_url.into(),
        long_url: long_url.into(),
        provider: "da.gd".into(),
        favorite: false,
        title: None,
        description: None,
        created_at: 1_700_000_000,
        qr_png: None,
    }
}

#[tokio::test]
async fn test_local_record_short_circuits() {
    let storage = Arc::new(MemoryStorage::new());
    storage
        .upsert(&stored("https://da.gd/old", "https://example.com/"))
        .await
        .unwrap();
    let transport = dagd(HttpResponse::new(404, ""));
    let engine = engine(&transport).with_storage(storage);

    let outcome = engine
        .create(&request("da.gd", "example.com", ""))
        .await;
    assert_eq!(outcome, ShortenOutcome::success("https://da.gd/old"));
    assert_eq!(transport.calls(), 0);

    let same_alias = engine
        .create(&request("da.gd", "https://example.com", "old"))
        .await;
    assert_eq!(same_alias, ShortenOutcome::success("https://da.gd/old"));
    assert_eq!(transport.calls(), 0);

    // A different alias is a new link.
    let other = engine
        .create(&request("da.gd", "https://example.com", "abc"))
        .await;
    assert_eq!(other, ShortenOutcome::success("https://da.gd/abc"));
    assert_eq!(transport.calls(), 2);
}

#[tokio::test]
async fn test_local_record_of_other_provider_is_ignored() {
    let storage = Arc::new(MemoryStorage::new());
    let mut record = stored("https://v.gd/old", "https://example.com");
    record.provider = "v.gd".into();
    storage.upsert(&record).await.unwrap();
    let transport = dagd(HttpResponse::new(404, ""));

    let outcome = engine(&transport)
        .with_storage(storage)
        .create(&request("da.gd", "https://example.com", ""))
        .await;

    assert_eq!(outcome, ShortenOutcome::success("https://da.gd/abc"));
    assert_eq!(transport.calls(), 1);
}

#[tokio::test]
async fn test_check_alias_reports_taken() {
    let transport = dagd(HttpResponse::new(200, "https://example.com"));

    let check = engine(&transport)
        .check_alias(providers::find("da.gd").unwrap(), "abc")
        .await;

    assert_eq!(
        check,
        AliasCheck::Taken {
            short_url: "https://da.gd/abc".into(),
            long_url: "https://example.com".into()
        }
    );
}

#[tokio::test]
async fn test_missing_capabilities_are_typed_failures() {
    let transport = Arc::new(ScriptedTransport::new(|_| {
        panic!("no request expected");
    }));
    let engine = engine(&transport);

    let check = engine
        .check_alias(providers::find("tinyurl.com").unwrap(), "abcde")
        .await;
    assert!(matches!(check, AliasCheck::Inconclusive(_)));

    let clicks = engine
        .click_count(providers::find("da.gd").unwrap(), "https://da.gd/abc")
        .await;
    assert!(clicks.is_err());
    assert_eq!(transport.calls(), 0);
}

#[tokio::test]
async fn test_click_count() {
    let transport = Arc::new(ScriptedTransport::new(|request| {
        assert_eq!(request.url, "https://owo.vc/api/v2/link/owo.vc%2Fsome-words");
        Ok(HttpResponse::new(200, r#"{"id":"owo.vc/some-words","visits":17}"#))
    }));

    let clicks = engine(&transport)
        .click_count(providers::find("owo.vc").unwrap(), "https://owo.vc/some-words")
        .await;

    assert_eq!(clicks, Ok(17));
}

#[tokio::test]
async fn test_concurrent_creates_are_independent() {
    let transport = Arc::new(ScriptedTransport::new(|request| {
        let alias = request
            .url
            .split(['?', '&'])
            .find_map(|pair| pair.strip_prefix("alias="))
            .unwrap_or_default();
        Ok(HttpResponse::new(200, format!("https://tinyurl.com/{alias}")))
    }));
    let engine = Arc::new(OrchestrationEngine::new(transport.clone(), Arc::new(Online)));

    let mut handles = vec![];
    for i in 0..10 {
        let engine = Arc::clone(&engine);
        handles.push(tokio::spawn(async move {
            let request = request("tinyurl.com", "https://example.com", &format!("alias{i:02}"));
            engine.create(&request).await
        }));
    }

    for (i, handle) in handles.into_iter().enumerate() {
        let outcome = handle.await.unwrap();
        assert_eq!(
            outcome,
            ShortenOutcome::success(format!("https://tinyurl.com/alias{i:02}"))
        );
    }
    assert_eq!(transport.calls(), 10);
}
