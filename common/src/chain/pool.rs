use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use alloy_provider::{Provider, ProviderBuilder, RootProvider};
use dashmap::DashMap;
use log::{debug, warn};

use crate::error::{GatewayError, Result};

const PROBE_FRESHNESS: Duration = Duration::from_secs(15);
const UNHEALTHY_COOLDOWN: Duration = Duration::from_secs(30);

struct EndpointHealth {
    healthy_until: Option<Instant>,
    unhealthy_until: Option<Instant>,
}

/// A pool of chain RPC endpoints with lazy health-checking and ordered
/// failover (spec §4.1). No sticky affinity: every `acquire` starts from the
/// front of the endpoint list.
pub struct RpcPool {
    endpoints: Vec<(String, RootProvider)>,
    health: DashMap<usize, EndpointHealth>,
    probe_counter: AtomicU64,
}

impl RpcPool {
    pub fn new(endpoint_urls: Vec<String>) -> anyhow::Result<Self> {
        let mut endpoints = Vec::with_capacity(endpoint_urls.len());
        for url in &endpoint_urls {
            let parsed = url.parse()?;
            let provider = ProviderBuilder::new().on_http(parsed);
            endpoints.push((url.clone(), provider));
        }
        Ok(RpcPool { endpoints, health: DashMap::new(), probe_counter: AtomicU64::new(0) })
    }

    /// Returns a currently-responsive client and its index. Tries endpoints
    /// in order, probing lazily when an endpoint's last probe is stale,
    /// marking failures unhealthy for a cool-down window. `NoHealthyEndpoint`
    /// if every endpoint is down (spec §4.1). The index is returned so a
    /// caller whose actual call (not just the lazy probe) fails can report
    /// it back through `mark_unhealthy` instead of waiting out the full
    /// probe-freshness window on a endpoint already known to be bad.
    pub async fn acquire(&self) -> Result<(usize, &RootProvider)> {
        let now = Instant::now();
        for (idx, (url, provider)) in self.endpoints.iter().enumerate() {
            if let Some(health) = self.health.get(&idx) {
                if let Some(until) = health.unhealthy_until {
                    if until > now {
                        continue;
                    }
                }
                if let Some(until) = health.healthy_until {
                    if until > now {
                        return Ok((idx, provider));
                    }
                }
            }

            if self.probe(idx, url, provider).await {
                return Ok((idx, provider));
            }
        }

        warn!("rpc pool: no healthy endpoint among {} candidates", self.endpoints.len());
        Err(GatewayError::NoHealthyEndpoint)
    }

    /// Marks an endpoint unhealthy immediately, bypassing the probe-freshness
    /// window, for a caller that observed a live call fail against it.
    pub fn mark_unhealthy(&self, idx: usize) {
        self.health.insert(idx, EndpointHealth {
            healthy_until: None,
            unhealthy_until: Some(Instant::now() + UNHEALTHY_COOLDOWN),
        });
    }

    async fn probe(&self, idx: usize, url: &str, provider: &RootProvider) -> bool {
        self.probe_counter.fetch_add(1, Ordering::Relaxed);
        match provider.get_block_number().await {
            Ok(_) => {
                debug!("rpc endpoint {url} healthy");
                self.health.insert(idx, EndpointHealth {
                    healthy_until: Some(Instant::now() + PROBE_FRESHNESS),
                    unhealthy_until: None,
                });
                true
            }
            Err(err) => {
                warn!("rpc endpoint {url} probe failed: {err}");
                self.health.insert(idx, EndpointHealth {
                    healthy_until: None,
                    unhealthy_until: Some(Instant::now() + UNHEALTHY_COOLDOWN),
                });
                false
            }
        }
    }

    pub fn endpoint_count(&self) -> usize {
        self.endpoints.len()
    }
}

pub type SharedRpcPool = Arc<RpcPool>;
