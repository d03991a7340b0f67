//! # Cache
//!
//! Two-tier response cache sitting in front of the router's provider
//! fan-out. Local tier grounded on [`crate::repositories::cache::InMemoryCacheRepository`]
//! (TTL entries, hit/miss/eviction stats, LRU-by-last-access eviction).
//! Remote tier grounded on the original gateway's `CacheManager`
//! (Redis-with-local-fallback design), backed here by `sled` instead of a
//! network service. `get`/`set` both honor `CacheOptions.enabled` and a
//! per-request TTL override, matching the original.

pub mod key;
pub mod remote;

pub use key::KeyInput;
pub use remote::{RemoteCache, SledRemoteCache};

use crate::models::{CacheOptions, SearchOptions, SearchResponse};
use crate::repositories::{CacheRepository, InMemoryCacheRepository};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Orchestrates the local and (optional) remote cache tiers behind one
/// request-shaped API: callers pass the same inputs they'd use to build a
/// cache key, not a raw string.
pub struct CacheManager {
    local: Arc<InMemoryCacheRepository>,
    remote: Option<Arc<dyn RemoteCache>>,
    default_ttl_secs: u64,
}

impl CacheManager {
    #[must_use]
    pub fn new(local: Arc<InMemoryCacheRepository>, default_ttl_secs: u64) -> Self {
        Self {
            local,
            remote: None,
            default_ttl_secs,
        }
    }

    #[must_use]
    pub fn with_remote(mut self, remote: Arc<dyn RemoteCache>) -> Self {
        self.remote = Some(remote);
        self
    }

    fn cache_options(options: Option<&SearchOptions>) -> Option<&CacheOptions> {
        options.and_then(|o| o.cache.as_ref())
    }

    pub async fn get(
        &self,
        providers: &[String],
        input: KeyInput<'_>,
        options: Option<&SearchOptions>,
    ) -> Option<SearchResponse> {
        let cache_opts = Self::cache_options(options);
        if let Some(opts) = cache_opts {
            if !opts.enabled {
                return None;
            }
        }

        let key = key::build(providers, input, options, cache_opts.and_then(|c| c.key.as_deref()));

        if let Ok(Some(response)) = self.local.get::<SearchResponse>(&key).await {
            debug!(cache_key = %key, "local cache hit");
            return Some(response);
        }

        if let Some(remote) = &self.remote {
            match remote.get(&key).await {
                Ok(Some(response)) => {
                    debug!(cache_key = %key, "remote cache hit");
                    let ttl = cache_opts.map_or(self.default_ttl_secs, |c| c.ttl_seconds);
                    let _ = self
                        .local
                        .set_with_ttl(&key, response.clone(), Duration::from_secs(ttl))
                        .await;
                    return Some(response);
                }
                Ok(None) => {}
                Err(e) => warn!(error = %e, "remote cache get failed"),
            }
        }

        None
    }

    pub async fn set(
        &self,
        providers: &[String],
        input: KeyInput<'_>,
        options: Option<&SearchOptions>,
        response: &SearchResponse,
    ) {
        let cache_opts = Self::cache_options(options);
        if let Some(opts) = cache_opts {
            if !opts.enabled {
                return;
            }
        }

        let key = key::build(providers, input, options, cache_opts.and_then(|c| c.key.as_deref()));
        let ttl = cache_opts.map_or(self.default_ttl_secs, |c| c.ttl_seconds);

        if let Err(e) = self
            .local
            .set_with_ttl(&key, response.clone(), Duration::from_secs(ttl))
            .await
        {
            warn!(error = %e, "local cache set failed");
        }

        if let Some(remote) = &self.remote {
            if let Err(e) = remote.set(&key, response, ttl).await {
                warn!(error = %e, "remote cache set failed");
            }
        }
    }
}
