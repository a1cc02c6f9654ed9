//! Fakes shared by the integration suites.

#![allow(dead_code)]

use async_trait::async_trait;
use magpie::connectivity::Connectivity;
use magpie::transport::{HttpRequest, HttpResponse, HttpTransport, TransportError};
use std::sync::Mutex;

type Responder = Box<dyn Fn(&HttpRequest) -> Result<HttpResponse, TransportError> + Send + Sync>;

/// Transport that answers from a closure and records every request.
pub struct ScriptedTransport {
    requests: Mutex<Vec<HttpRequest>>,
    respond: Responder,
}

impl ScriptedTransport {
    pub fn new<F>(respond: F) -> Self
    where
        F: Fn(&HttpRequest) -> Result<HttpResponse, TransportError> + Send + Sync + 'static,
    {
        Self {
            requests: Mutex::new(Vec::new()),
            respond: Box::new(respond),
        }
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn calls_matching(&self, fragment: &str) -> usize {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter(|request| request.url.contains(fragment))
            .count()
    }
}

#[async_trait]
impl HttpTransport for ScriptedTransport {
    async fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        self.requests.lock().unwrap().push(request.clone());
        (self.respond)(request)
    }
}

pub struct Online;

#[async_trait]
impl Connectivity for Online {
    async fn has_usable_network(&self) -> bool {
        true
    }
}

pub struct Offline;

#[async_trait]
impl Connectivity for Offline {
    async fn has_usable_network(&self) -> bool {
        false
    }
}
