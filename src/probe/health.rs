//! Health checking with ordered endpoint fallback and bounded sweeps.

use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use tracing::{debug, info, warn};

use crate::models::{ProbeResult, ProxyEndpoint};
use crate::probe::client::{ProbeClient, ProbeOutcome};

/// Probes one proxy against an ordered list of independent test endpoints.
///
/// Network-layer errors and timeouts advance to the next endpoint; a
/// response with the wrong status is a definitive failure with no fallback.
pub struct HealthChecker {
    client: Arc<dyn ProbeClient>,
    endpoints: Vec<String>,
    timeout: Duration,
}

impl HealthChecker {
    pub fn new(client: Arc<dyn ProbeClient>, endpoints: Vec<String>, timeout: Duration) -> Self {
        Self {
            client,
            endpoints,
            timeout,
        }
    }

    /// Probe a single proxy, trying each endpoint in order
    pub async fn probe(&self, target: &ProxyEndpoint) -> ProbeResult {
        let proxy_url = target.url();
        let mut last_error = String::new();
        let mut last_endpoint = "";

        for endpoint in &self.endpoints {
            last_endpoint = endpoint;

            match self.client.fetch(&proxy_url, endpoint, self.timeout).await {
                ProbeOutcome::Ok { latency_ms } => {
                    debug!(
                        proxy_id = target.id,
                        host = %target.host,
                        latency_ms = latency_ms,
                        endpoint = %endpoint,
                        "Probe successful"
                    );
                    return ProbeResult::ok(target.id, latency_ms, endpoint);
                }
                ProbeOutcome::BadStatus { status, .. } => {
                    // The proxy relayed a response; retrying elsewhere
                    // would not change the verdict
                    return ProbeResult::failed(target.id, format!("HTTP {}", status), endpoint);
                }
                ProbeOutcome::NetworkError { reason } => {
                    debug!(
                        proxy_id = target.id,
                        endpoint = %endpoint,
                        error = %reason,
                        "Probe endpoint unreachable"
                    );
                    last_error = reason;
                }
                ProbeOutcome::TimedOut => {
                    debug!(
                        proxy_id = target.id,
                        endpoint = %endpoint,
                        timeout_secs = self.timeout.as_secs(),
                        "Probe timed out"
                    );
                    last_error = format!("timed out after {}s", self.timeout.as_secs());
                }
            }
        }

        warn!(
            proxy_id = target.id,
            host = %target.host,
            port = target.port,
            "Probe failed on all endpoints"
        );

        ProbeResult::failed(
            target.id,
            format!(
                "all {} endpoints failed for {}:{}; last error: {}",
                self.endpoints.len(),
                target.host,
                target.port,
                last_error
            ),
            last_endpoint,
        )
    }

    /// Probe many proxies with at most `max_concurrent` in flight.
    ///
    /// Results are unordered; every target yields exactly one result and a
    /// failing probe never disturbs its siblings.
    pub async fn probe_batch(
        &self,
        targets: Vec<ProxyEndpoint>,
        max_concurrent: usize,
    ) -> Vec<ProbeResult> {
        let max_concurrent = max_concurrent.max(1);
        info!(
            count = targets.len(),
            max_concurrent = max_concurrent,
            "Probing proxies"
        );

        let results: Vec<ProbeResult> = futures::stream::iter(targets)
            .map(|target| async move { self.probe(&target).await })
            .buffer_unordered(max_concurrent)
            .collect()
            .await;

        let successful = results.iter().filter(|r| r.success).count();
        info!(
            total = results.len(),
            successful = successful,
            failed = results.len() - successful,
            "Probe sweep complete"
        );

        results
    }
}
