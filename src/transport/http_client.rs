use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{header, redirect, Client};
use std::time::Duration;
use tracing::debug;

use super::{HttpRequest, HttpResponse, HttpTransport, TransportError};
use crate::config::HttpConfig;
use crate::providers::Method;

/// [`HttpTransport`] backed by one shared `reqwest` client.
///
/// Redirects are not followed: services that answer with `Location` are read
/// from the 3xx response itself.
#[derive(Clone)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    pub fn new(user_agent: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .redirect(redirect::Policy::none())
            .build()
            .context("failed to build HTTP client")?;
        Ok(Self { client })
    }

    pub fn from_config(config: &HttpConfig) -> Result<Self> {
        Self::new(&config.user_agent, Duration::from_secs(config.timeout_secs))
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        let method = match request.method {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
        };
        let mut builder = self.client.request(method, &request.url);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = &request.body {
            let (content_type, bytes) = body.encode();
            builder = builder.header(header::CONTENT_TYPE, content_type).body(bytes);
        }
        if let Some(timeout) = request.timeout {
            builder = builder.timeout(timeout);
        }

        debug!("{} {}", request.method.as_str(), request.url);
        let response = builder.send().await.map_err(map_error)?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|value| (name.as_str().to_ascii_lowercase(), value.to_string()))
            })
            .collect();
        let body = response.bytes().await.map_err(map_error)?.to_vec();
        debug!(status, bytes = body.len(), "response from {}", request.url);

        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}

fn map_error(error: reqwest::Error) -> TransportError {
    if error.is_timeout() {
        TransportError::Timeout
    } else if error.is_connect() {
        TransportError::Connect(error.to_string())
    } else {
        TransportError::Other(error.to_string())
    }
}
