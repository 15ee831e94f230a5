//! Single-endpoint probe transport.
//!
//! One probe is one GET through the proxy against one test endpoint with its
//! own timeout. Failures come back as data, not errors, so concurrent sweeps
//! aggregate them without cross-task error handling.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use tracing::debug;

/// Outcome of one endpoint attempt through one proxy
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeOutcome {
    /// HTTP 200 with a readable body
    Ok { latency_ms: i32 },
    /// A response arrived but with the wrong status; the proxy works,
    /// the endpoint answer is unusable
    BadStatus { status: u16, latency_ms: i32 },
    /// Network-layer failure (connect/DNS/TLS)
    NetworkError { reason: String },
    /// The attempt exceeded its timeout
    TimedOut,
}

/// Issues one probe request; mocked out in tests
#[async_trait]
pub trait ProbeClient: Send + Sync {
    async fn fetch(&self, proxy_url: &str, endpoint: &str, timeout: Duration) -> ProbeOutcome;
}

/// reqwest-backed probe transport
#[derive(Debug, Clone, Default)]
pub struct HttpProbeClient;

impl HttpProbeClient {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ProbeClient for HttpProbeClient {
    async fn fetch(&self, proxy_url: &str, endpoint: &str, timeout: Duration) -> ProbeOutcome {
        let proxy = match reqwest::Proxy::all(proxy_url) {
            Ok(proxy) => proxy,
            Err(e) => {
                return ProbeOutcome::NetworkError {
                    reason: format!("invalid proxy url: {}", e),
                }
            }
        };

        let client = match reqwest::Client::builder()
            .proxy(proxy)
            .timeout(timeout)
            .build()
        {
            Ok(client) => client,
            Err(e) => {
                return ProbeOutcome::NetworkError {
                    reason: format!("client build failed: {}", e),
                }
            }
        };

        let start = Instant::now();

        let response = match tokio::time::timeout(timeout, client.get(endpoint).send()).await {
            Ok(Ok(response)) => response,
            Ok(Err(e)) if e.is_timeout() => return ProbeOutcome::TimedOut,
            Ok(Err(e)) => {
                debug!(endpoint = endpoint, error = %e, "Probe request failed");
                return ProbeOutcome::NetworkError {
                    reason: e.to_string(),
                };
            }
            Err(_) => return ProbeOutcome::TimedOut,
        };

        let latency_ms = start.elapsed().as_millis().min(i32::MAX as u128) as i32;
        let status = response.status();

        if status.as_u16() != 200 {
            return ProbeOutcome::BadStatus {
                status: status.as_u16(),
                latency_ms,
            };
        }

        // The body must be readable for the proxy to count as live
        match response.text().await {
            Ok(_) => ProbeOutcome::Ok { latency_ms },
            Err(e) if e.is_timeout() => ProbeOutcome::TimedOut,
            Err(e) => ProbeOutcome::NetworkError {
                reason: format!("body read failed: {}", e),
            },
        }
    }
}
