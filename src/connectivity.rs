//! "Is there a usable network?" precondition checked before any provider call.

use async_trait::async_trait;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::time::timeout;
use tracing::debug;

use crate::config::ConnectivityConfig;

#[async_trait]
pub trait Connectivity: Send + Sync {
    async fn has_usable_network(&self) -> bool;
}

/// Dials a well-known address and reports whether the handshake completes.
pub struct TcpProbe {
    addr: String,
    timeout: Duration,
}

impl TcpProbe {
    pub fn new(addr: impl Into<String>, timeout: Duration) -> Self {
        Self {
            addr: addr.into(),
            timeout,
        }
    }
}

#[async_trait]
impl Connectivity for TcpProbe {
    async fn has_usable_network(&self) -> bool {
        match timeout(self.timeout, TcpStream::connect(&self.addr)).await {
            Ok(Ok(_)) => true,
            Ok(Err(e)) => {
                debug!("connectivity probe to {} failed: {}", self.addr, e);
                false
            }
            Err(_) => {
                debug!("connectivity probe to {} timed out", self.addr);
                false
            }
        }
    }
}

pub struct AssumeOnline;

#[async_trait]
impl Connectivity for AssumeOnline {
    async fn has_usable_network(&self) -> bool {
        true
    }
}

/// Probe selected by configuration.
pub fn from_config(config: &ConnectivityConfig) -> Box<dyn Connectivity> {
    if config.assume_online {
        Box::new(AssumeOnline)
    } else {
        Box::new(TcpProbe::new(
            config.probe_addr.clone(),
            Duration::from_millis(config.probe_timeout_ms),
        ))
    }
}
