//! Remote (durable) cache tier.
//!
//! The original backs this with Redis, falling back to an in-process mock
//! when no Redis connection is available. Rather than add a network
//! dependency this crate doesn't otherwise need, the remote tier is backed
//! by `sled`, which the teacher already depends on: an embedded,
//! crash-safe key-value store gives the same durable key-to-bytes contract
//! the original gets from Redis without requiring a running service. A
//! [`RemoteCache`] trait keeps the door open for a real Redis-backed
//! implementation later without touching callers.

use crate::models::SearchResponse;
use crate::{Error, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

#[async_trait]
pub trait RemoteCache: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<SearchResponse>>;
    async fn set(&self, key: &str, value: &SearchResponse, ttl_secs: u64) -> Result<()>;
    async fn invalidate(&self, pattern: Option<&str>) -> Result<()>;
}

#[derive(Serialize, Deserialize)]
struct Envelope {
    expires_at: u64,
    response: SearchResponse,
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

/// `sled`-backed [`RemoteCache`].
pub struct SledRemoteCache {
    db: sled::Db,
}

impl SledRemoteCache {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let db = sled::open(path).map_err(|e| Error::Cache {
            operation: "open".to_string(),
            reason: e.to_string(),
        })?;
        Ok(Self { db })
    }
}

#[async_trait]
impl RemoteCache for SledRemoteCache {
    async fn get(&self, key: &str) -> Result<Option<SearchResponse>> {
        let Some(bytes) = self.db.get(key).map_err(|e| Error::Cache {
            operation: "get".to_string(),
            reason: e.to_string(),
        })?
        else {
            return Ok(None);
        };

        let envelope: Envelope = bincode::deserialize(&bytes).map_err(|e| Error::Cache {
            operation: "deserialize".to_string(),
            reason: e.to_string(),
        })?;

        if envelope.expires_at <= unix_now() {
            let _ = self.db.remove(key);
            return Ok(None);
        }

        Ok(Some(envelope.response))
    }

    async fn set(&self, key: &str, value: &SearchResponse, ttl_secs: u64) -> Result<()> {
        let envelope = Envelope {
            expires_at: unix_now() + ttl_secs,
            response: value.clone(),
        };
        let bytes = bincode::serialize(&envelope).map_err(|e| Error::Cache {
            operation: "serialize".to_string(),
            reason: e.to_string(),
        })?;
        self.db.insert(key, bytes).map_err(|e| Error::Cache {
            operation: "set".to_string(),
            reason: e.to_string(),
        })?;
        Ok(())
    }

    async fn invalidate(&self, pattern: Option<&str>) -> Result<()> {
        match pattern {
            Some(pattern) => {
                let keys: Vec<Vec<u8>> = self
                    .db
                    .iter()
                    .keys()
                    .filter_map(std::result::Result::ok)
                    .filter(|k| {
                        String::from_utf8_lossy(k).contains(pattern)
                    })
                    .collect();
                for key in keys {
                    let _ = self.db.remove(key);
                }
            }
            None => {
                self.db.clear().map_err(|e| Error::Cache {
                    operation: "clear".to_string(),
                    reason: e.to_string(),
                })?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ResponseMetadata, ResponseStatus};

    fn sample_response() -> SearchResponse {
        SearchResponse {
            status: ResponseStatus::Success,
            request_id: "r1".to_string(),
            results: vec![],
            metadata: ResponseMetadata {
                total_results: Some(0),
                query_time_ms: 1,
                providers_used: vec![],
                providers_failed: None,
                cache_hit: false,
                transformations_applied: None,
                filters_applied: None,
                spell_corrected: false,
            },
            errors: None,
            provider_used: None,
            query_id: None,
        }
    }

    #[tokio::test]
    async fn set_then_get_roundtrips() {
        let dir = tempfile::tempdir().unwrap();
        let cache = SledRemoteCache::open(dir.path()).unwrap();
        cache.set("key1", &sample_response(), 60).await.unwrap();
        let fetched = cache.get("key1").await.unwrap();
        assert!(fetched.is_some());
    }

    #[tokio::test]
    async fn expired_entry_is_not_returned() {
        let dir = tempfile::tempdir().unwrap();
        let cache = SledRemoteCache::open(dir.path()).unwrap();
        cache.set("key1", &sample_response(), 0).await.unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(1100)).await;
        assert!(cache.get("key1").await.unwrap().is_none());
    }
}
