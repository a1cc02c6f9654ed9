use async_trait::async_trait;
use moka::future::Cache;
use std::sync::Arc;
use std::time::Duration;

use super::{HttpRequest, HttpResponse, HttpTransport, TransportError};

/// Transport wrapper that answers repeated `cacheable` requests from memory.
///
/// Only successful responses are cached, so a rate-limited click count is
/// retried on the next call.
pub struct CachingTransport {
    /// Underlying transport
    inner: Arc<dyn HttpTransport>,
    responses: Cache<String, HttpResponse>,
}

impl CachingTransport {
    pub fn new(inner: Arc<dyn HttpTransport>, max_entries: u64, ttl: Duration) -> Self {
        let responses = Cache::builder()
            .max_capacity(max_entries)
            .time_to_live(ttl)
            .build();
        Self { inner, responses }
    }
}

#[async_trait]
impl HttpTransport for CachingTransport {
    async fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        if !request.cacheable {
            return self.inner.execute(request).await;
        }

        let key = request.cache_key();
        if let Some(response) = self.responses.get(&key).await {
            tracing::debug!("cache hit for {}", request.url);
            return Ok(response);
        }

        let response = self.inner.execute(request).await?;
        if response.is_success() {
            self.responses.insert(key, response.clone()).await;
        }
        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::Method;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Counting {
        calls: AtomicUsize,
        status: u16,
    }

    #[async_trait]
    impl HttpTransport for Counting {
        async fn execute(&self, _request: &HttpRequest) -> Result<HttpResponse, TransportError> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(HttpResponse::new(self.status, format!("{{\"visits\":{n}}}")))
        }
    }

    fn request(cacheable: bool) -> HttpRequest {
        HttpRequest {
            method: Method::Get,
            url: "https://owo.vc/api/v2/link/owo.vc%2Fabc".into(),
            headers: Vec::new(),
            body: None,
            timeout: None,
            cacheable,
        }
    }

    fn counting(status: u16) -> Arc<Counting> {
        Arc::new(Counting {
            calls: AtomicUsize::new(0),
            status,
        })
    }

    #[tokio::test]
    async fn test_cacheable_requests_hit_inner_once() {
        let inner = counting(200);
        let transport = CachingTransport::new(inner.clone(), 100, Duration::from_secs(60));

        let first = transport.execute(&request(true)).await.unwrap();
        let second = transport.execute(&request(true)).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(inner.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_other_requests_pass_through() {
        let inner = counting(200);
        let transport = CachingTransport::new(inner.clone(), 100, Duration::from_secs(60));

        transport.execute(&request(false)).await.unwrap();
        transport.execute(&request(false)).await.unwrap();

        assert_eq!(inner.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_failures_are_not_cached() {
        let inner = counting(429);
        let transport = CachingTransport::new(inner.clone(), 100, Duration::from_secs(60));

        transport.execute(&request(true)).await.unwrap();
        transport.execute(&request(true)).await.unwrap();

        assert_eq!(inner.calls.load(Ordering::SeqCst), 2);
    }
}
