//! # Provider Manager
//!
//! Owns the registry of configured provider adapters, tracks their health
//! via a background monitoring loop, and answers "which providers can serve
//! this request" queries for the router. Grounded on the original gateway's
//! provider manager: health checks run on an interval, a provider's
//! availability is gated on its last known health rather than probed
//! per-request, and an unknown-health provider is optimistically assumed
//! available so a fresh process doesn't reject every request before its
//! first health sweep completes.

use crate::adapters::ProviderAdapter;
use crate::models::{HealthStatus, ProviderHealth, ProviderKind};
use crate::resilience::retry::RetryConfig;
use crate::resilience::{CircuitBreaker, TokenBucket};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Generous default admission rate for a provider with no configured limit:
/// burst up to 50 requests, refilling at 20/s.
const DEFAULT_RATE_LIMIT_CAPACITY: f64 = 50.0;
const DEFAULT_RATE_LIMIT_REFILL_PER_SEC: f64 = 20.0;

struct RegisteredProvider {
    adapter: Arc<dyn ProviderAdapter>,
    circuit_breaker: Arc<CircuitBreaker>,
    rate_limiter: Arc<TokenBucket>,
    retry_config: RetryConfig,
}

/// Registry, health monitor, and selection logic for configured providers.
pub struct ProviderManager {
    providers: RwLock<HashMap<String, RegisteredProvider>>,
    health: Arc<RwLock<HashMap<String, ProviderHealth>>>,
    health_check_interval: Duration,
    health_task: RwLock<Option<JoinHandle<()>>>,
}

impl ProviderManager {
    #[must_use]
    pub fn new(health_check_interval: Duration) -> Self {
        Self {
            providers: RwLock::new(HashMap::new()),
            health: Arc::new(RwLock::new(HashMap::new())),
            health_check_interval,
            health_task: RwLock::new(None),
        }
    }

    /// Register an adapter with its own circuit breaker and the default
    /// admission rate limit.
    pub async fn register(
        &self,
        adapter: Arc<dyn ProviderAdapter>,
        circuit_breaker_config: crate::resilience::circuit_breaker::CircuitBreakerConfig,
    ) {
        self.register_with_rate_limit(adapter, circuit_breaker_config, None)
            .await;
    }

    /// Register an adapter with an explicit `(capacity, refill_per_sec)`
    /// token bucket, falling back to a generous default when `rate_limit`
    /// is `None`.
    pub async fn register_with_rate_limit(
        &self,
        adapter: Arc<dyn ProviderAdapter>,
        circuit_breaker_config: crate::resilience::circuit_breaker::CircuitBreakerConfig,
        rate_limit: Option<(f64, f64)>,
    ) {
        self.register_full(adapter, circuit_breaker_config, rate_limit, None)
            .await;
    }

    /// Register an adapter with every per-provider resilience knob
    /// explicit: circuit breaker config, `(capacity, refill_per_sec)` rate
    /// limit, and retry policy. `None` falls back to a generous rate-limit
    /// default and `RetryConfig::default()`, respectively.
    pub async fn register_full(
        &self,
        adapter: Arc<dyn ProviderAdapter>,
        circuit_breaker_config: crate::resilience::circuit_breaker::CircuitBreakerConfig,
        rate_limit: Option<(f64, f64)>,
        retry_config: Option<RetryConfig>,
    ) {
        let name = adapter.name().to_string();
        let circuit_breaker = Arc::new(CircuitBreaker::new(name.clone(), circuit_breaker_config));
        let (capacity, refill_rate) =
            rate_limit.unwrap_or((DEFAULT_RATE_LIMIT_CAPACITY, DEFAULT_RATE_LIMIT_REFILL_PER_SEC));
        let rate_limiter = Arc::new(TokenBucket::new(capacity, refill_rate));
        self.providers.write().await.insert(
            name.clone(),
            RegisteredProvider {
                adapter,
                circuit_breaker,
                rate_limiter,
                retry_config: retry_config.unwrap_or_default(),
            },
        );
        self.health
            .write()
            .await
            .insert(name.clone(), ProviderHealth::unknown(name));
    }

    pub fn adapter(&self, name: &str) -> Option<Arc<dyn ProviderAdapter>> {
        self.providers
            .try_read()
            .ok()
            .and_then(|providers| providers.get(name).map(|p| p.adapter.clone()))
    }

    pub fn circuit_breaker(&self, name: &str) -> Option<Arc<CircuitBreaker>> {
        self.providers
            .try_read()
            .ok()
            .and_then(|providers| providers.get(name).map(|p| p.circuit_breaker.clone()))
    }

    pub fn rate_limiter(&self, name: &str) -> Option<Arc<TokenBucket>> {
        self.providers
            .try_read()
            .ok()
            .and_then(|providers| providers.get(name).map(|p| p.rate_limiter.clone()))
    }

    pub fn retry_config(&self, name: &str) -> RetryConfig {
        self.providers
            .try_read()
            .ok()
            .and_then(|providers| providers.get(name).map(|p| p.retry_config.clone()))
            .unwrap_or_default()
    }

    /// Rate limiter admission, then circuit breaker wrapping, then
    /// `timeout` against the time remaining until `deadline` — the
    /// composition a single attempt at a provider call goes through.
    /// `deadline` is the same instant across every retry of one
    /// `call_guarded` invocation, so a slow attempt leaves later retries
    /// less time rather than each getting a fresh full `timeout`.
    async fn call_once<T, F, Fut>(
        &self,
        name: &str,
        deadline: Instant,
        timeout: Duration,
        operation: &F,
    ) -> crate::Result<T>
    where
        F: Fn() -> Fut,
        Fut: std::future::Future<Output = crate::Result<T>>,
    {
        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            return Err(crate::Error::Timeout { timeout });
        }

        if let Some(limiter) = self.rate_limiter(name) {
            if !limiter.try_acquire(1.0).await {
                return Err(crate::Error::RateLimitExceeded {
                    retry_after: Duration::from_millis(100),
                });
            }
        }

        let Some(breaker) = self.circuit_breaker(name) else {
            return tokio::time::timeout(remaining, operation())
                .await
                .unwrap_or(Err(crate::Error::Timeout { timeout }));
        };

        breaker
            .call(|| async move {
                tokio::time::timeout(remaining, operation())
                    .await
                    .unwrap_or(Err(crate::Error::Timeout { timeout }))
            })
            .await
    }

    /// The full composition every concrete provider call goes through:
    /// the whole rate-limiter/circuit-breaker/timeout attempt, retried per
    /// the provider's configured [`RetryConfig`] on transient failure, all
    /// against a single deadline set once at `timeout` from now. Mirrors
    /// `ProviderAdapter`'s documented call order.
    pub async fn call_guarded<T, F, Fut>(
        &self,
        name: &str,
        timeout: Duration,
        operation: F,
    ) -> crate::Result<T>
    where
        F: Fn() -> Fut,
        Fut: std::future::Future<Output = crate::Result<T>>,
    {
        let retry_config = self.retry_config(name);
        let deadline = Instant::now() + timeout;
        crate::resilience::retry::retry_with_config(
            || self.call_once(name, deadline, timeout, &operation),
            retry_config,
            name,
        )
        .await
    }

    /// Start the background health-monitoring loop. Idempotent: calling
    /// this twice replaces the previous task.
    pub async fn start_health_monitor(self: &Arc<Self>) {
        let manager = Arc::clone(self);
        let handle = tokio::spawn(async move {
            loop {
                manager.run_health_sweep().await;
                tokio::time::sleep(manager.health_check_interval).await;
            }
        });
        *self.health_task.write().await = Some(handle);
    }

    pub async fn shutdown(&self) {
        if let Some(handle) = self.health_task.write().await.take() {
            handle.abort();
        }
    }

    async fn run_health_sweep(&self) {
        let names: Vec<String> = self.providers.read().await.keys().cloned().collect();
        let mut healthy = 0;
        let mut degraded = 0;
        let mut unhealthy = 0;

        for name in names {
            let status = self.check_provider_health(&name).await;
            match status {
                HealthStatus::Healthy => healthy += 1,
                HealthStatus::Degraded => degraded += 1,
                HealthStatus::Unhealthy => unhealthy += 1,
                HealthStatus::Unknown => {}
            }
        }

        info!(
            healthy,
            degraded, unhealthy, "provider health sweep complete"
        );
    }

    /// Probe a single provider and record its health.
    pub async fn check_provider_health(&self, name: &str) -> HealthStatus {
        let adapter = match self.adapter(name) {
            Some(adapter) => adapter,
            None => return HealthStatus::Unknown,
        };

        let start = Instant::now();
        let outcome = adapter.health_check().await;
        let elapsed = start.elapsed();

        let mut health = self.health.write().await;
        let entry = health
            .entry(name.to_string())
            .or_insert_with(|| ProviderHealth::unknown(name));

        entry.last_check = chrono::Utc::now();
        entry.latency_ms = Some(elapsed.as_secs_f64() * 1000.0);

        match outcome {
            Ok(_) if elapsed > Duration::from_secs(5) => {
                entry.status = HealthStatus::Degraded;
                entry.error_message = Some("response time exceeded 5s".to_string());
            }
            Ok(_) => {
                entry.status = HealthStatus::Healthy;
                entry.error_message = None;
            }
            Err(e) => {
                entry.status = HealthStatus::Unhealthy;
                entry.error_message = Some(e.to_string());
                warn!(provider = name, error = %e, "provider health check failed");
            }
        }

        debug!(provider = name, status = ?entry.status, latency_ms = ?entry.latency_ms, "health check");
        entry.status
    }

    pub async fn health_snapshot(&self) -> HashMap<String, ProviderHealth> {
        self.health.read().await.clone()
    }

    /// Providers eligible for a request: named in `requested` (or all
    /// registered providers if `requested` is empty), matching `kind` if
    /// given, and not currently `Unhealthy` (an `Unknown` status, meaning no
    /// health check has run yet, is treated as available). When `requested`
    /// names providers explicitly, the caller's order is preserved; priority
    /// is only used to order the no-preference "all providers" case, where
    /// there is no request order to preserve.
    pub async fn available_providers(
        &self,
        requested: &[String],
        kind: Option<ProviderKind>,
    ) -> Vec<Arc<dyn ProviderAdapter>> {
        let providers = self.providers.read().await;
        let health = self.health.read().await;

        let mut candidates: Vec<(&String, &RegisteredProvider)> = if requested.is_empty() {
            let mut all: Vec<(&String, &RegisteredProvider)> = providers.iter().collect();
            all.sort_by_key(|(_, registered)| registered.adapter.priority());
            all
        } else {
            requested
                .iter()
                .filter_map(|name| providers.get_key_value(name))
                .collect()
        };

        candidates.retain(|(name, registered)| {
            let kind_matches = kind.map_or(true, |k| registered.adapter.kind() == k);
            let health_ok = health
                .get(*name)
                .map_or(true, |h| !matches!(h.status, HealthStatus::Unhealthy));
            kind_matches && health_ok
        });

        candidates
            .into_iter()
            .map(|(_, registered)| registered.adapter.clone())
            .collect()
    }

    /// Find an alternative provider of the same kind as `failed`, excluding
    /// it, preferring the one with the lowest recorded latency.
    pub async fn failover(&self, failed: &str) -> Option<Arc<dyn ProviderAdapter>> {
        let providers = self.providers.read().await;
        let failed_kind = providers.get(failed)?.adapter.kind();
        let health = self.health.read().await;

        providers
            .iter()
            .filter(|(name, registered)| {
                name.as_str() != failed
                    && registered.adapter.kind() == failed_kind
                    && health
                        .get(*name)
                        .map_or(true, |h| !matches!(h.status, HealthStatus::Unhealthy))
            })
            .min_by(|(a_name, _), (b_name, _)| {
                let a_latency = health.get(*a_name).and_then(|h| h.latency_ms).unwrap_or(f64::MAX);
                let b_latency = health.get(*b_name).and_then(|h| h.latency_ms).unwrap_or(f64::MAX);
                a_latency.partial_cmp(&b_latency).unwrap_or(std::cmp::Ordering::Equal)
            })
            .map(|(_, registered)| registered.adapter.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::MockWebSearchProvider;
    use crate::resilience::circuit_breaker::CircuitBreakerConfig;

    #[tokio::test]
    async fn unknown_health_providers_are_available() {
        let manager = ProviderManager::new(Duration::from_secs(60));
        manager
            .register(
                Arc::new(MockWebSearchProvider::new("web-a")),
                CircuitBreakerConfig::default(),
            )
            .await;

        let available = manager.available_providers(&[], None).await;
        assert_eq!(available.len(), 1);
    }

    #[tokio::test]
    async fn unhealthy_providers_are_excluded() {
        let manager = ProviderManager::new(Duration::from_secs(60));
        manager
            .register(
                Arc::new(MockWebSearchProvider::new("web-a")),
                CircuitBreakerConfig::default(),
            )
            .await;

        manager.check_provider_health("web-a").await;
        {
            let mut health = manager.health.write().await;
            health.get_mut("web-a").unwrap().status = HealthStatus::Unhealthy;
        }

        let available = manager.available_providers(&[], None).await;
        assert!(available.is_empty());
    }

    #[tokio::test]
    async fn failover_prefers_same_kind_lowest_latency() {
        let manager = ProviderManager::new(Duration::from_secs(60));
        manager
            .register(
                Arc::new(MockWebSearchProvider::new("web-a")),
                CircuitBreakerConfig::default(),
            )
            .await;
        manager
            .register(
                Arc::new(MockWebSearchProvider::new("web-b")),
                CircuitBreakerConfig::default(),
            )
            .await;

        let alt = manager.failover("web-a").await;
        assert_eq!(alt.map(|a| a.name().to_string()), Some("web-b".to_string()));
    }
}
