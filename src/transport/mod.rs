//! HTTP plumbing below the provider protocol.
//!
//! Requests are plain values produced by [`crate::protocol::request`]; an
//! [`HttpTransport`] executes them and hands back status, headers and body
//! bytes. Interpreting those bytes is not the transport's business.

pub mod cached;
pub mod http_client;

use async_trait::async_trait;
use std::borrow::Cow;
use std::time::Duration;
use thiserror::Error;

use crate::providers::Method;

pub use cached::CachingTransport;
pub use http_client::ReqwestTransport;

#[derive(Debug, Clone, PartialEq)]
pub enum Body {
    Form(Vec<(String, String)>),
    Json(serde_json::Value),
}

impl Body {
    /// Content type and encoded bytes.
    pub fn encode(&self) -> (&'static str, Vec<u8>) {
        match self {
            Body::Form(pairs) => {
                let encoded = url::form_urlencoded::Serializer::new(String::new())
                    .extend_pairs(pairs)
                    .finish();
                ("application/x-www-form-urlencoded", encoded.into_bytes())
            }
            Body::Json(value) => ("application/json", value.to_string().into_bytes()),
        }
    }

    /// Value of a form field or top-level JSON string field.
    pub fn field(&self, name: &str) -> Option<&str> {
        match self {
            Body::Form(pairs) => pairs
                .iter()
                .find(|(key, _)| key == name)
                .map(|(_, value)| value.as_str()),
            Body::Json(value) => value.get(name).and_then(serde_json::Value::as_str),
        }
    }
}

/// A fully described outbound request.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpRequest {
    pub method: Method,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<Body>,
    /// Overrides the transport's default timeout.
    pub timeout: Option<Duration>,
    /// Safe to answer from a short-lived response cache.
    pub cacheable: bool,
}

impl HttpRequest {
    pub fn cache_key(&self) -> String {
        let body = self
            .body
            .as_ref()
            .map(|body| String::from_utf8_lossy(&body.encode().1).into_owned())
            .unwrap_or_default();
        format!("{} {} {}", self.method.as_str(), self.url, body)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    /// Header names are stored lower-case.
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: body.into(),
        }
    }

    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.push((name.to_ascii_lowercase(), value.into()));
        self
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    pub fn text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.body)
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn is_redirect(&self) -> bool {
        (300..400).contains(&self.status)
    }
}

/// Failure before any response was received.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// DNS resolution or connection setup failed.
    #[error("could not connect: {0}")]
    Connect(String),
    #[error("request timed out")]
    Timeout,
    #[error("request failed: {0}")]
    Other(String),
}

#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError>;
}
