//! The provider adapter contract every concrete source must implement.
//!
//! Grounded on the trait shape of a source-provider interface generalized to
//! cover keyword, vector, and document-ingestion requests uniformly, and on
//! the original gateway's `ProviderAdapter` base class: every call goes
//! through rate limiting, then the circuit breaker, then a timeout, before
//! reaching the adapter's own request/response transform.

use crate::models::{JsonMap, ProviderHealth, ProviderKind, SearchOptions, SearchResult};
use async_trait::async_trait;
use std::fmt;
use std::time::Duration;

/// Errors a concrete adapter can report; translated into [`crate::Error`]
/// at the call site so the router never has to know about adapter-internal
/// failure shapes.
#[derive(Debug, Clone)]
pub enum ProviderError {
    Network(String),
    Parse(String),
    RateLimit,
    Auth(String),
    InvalidQuery(String),
    ServiceUnavailable(String),
    Timeout,
    /// The provider understood the request but doesn't implement the
    /// capability it names (vector search, indexing), as opposed to
    /// `InvalidQuery` which means the request itself is malformed.
    Unsupported { operation: String, reason: String },
    Other(String),
}

impl fmt::Display for ProviderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Network(msg) => write!(f, "network error: {msg}"),
            Self::Parse(msg) => write!(f, "parse error: {msg}"),
            Self::RateLimit => write!(f, "rate limited"),
            Self::Auth(msg) => write!(f, "authentication error: {msg}"),
            Self::InvalidQuery(msg) => write!(f, "invalid query: {msg}"),
            Self::ServiceUnavailable(msg) => write!(f, "service unavailable: {msg}"),
            Self::Timeout => write!(f, "timeout"),
            Self::Unsupported { operation, reason } => {
                write!(f, "operation '{operation}' not supported: {reason}")
            }
            Self::Other(msg) => write!(f, "{msg}"),
        }
    }
}

impl std::error::Error for ProviderError {}

pub type ProviderResult<T> = std::result::Result<T, ProviderError>;

/// Uniform contract over a heterogeneous information-retrieval source.
#[async_trait]
pub trait ProviderAdapter: Send + Sync {
    /// Stable, unique provider name matching the key it's registered under.
    fn name(&self) -> &str;

    /// The category of request this provider can serve.
    fn kind(&self) -> ProviderKind;

    /// Relative priority when more than one provider can serve a request;
    /// lower values are preferred.
    fn priority(&self) -> u8 {
        100
    }

    /// Minimum delay to hold between consecutive requests to this
    /// provider, independent of the shared rate limiter.
    fn base_delay(&self) -> Duration {
        Duration::from_millis(0)
    }

    /// Execute a keyword search.
    async fn search(
        &self,
        query: &str,
        options: &SearchOptions,
    ) -> ProviderResult<Vec<SearchResult>>;

    /// Execute a vector similarity search. Providers that don't support
    /// vector search (e.g. plain web-search adapters) return
    /// `ProviderError::Unsupported`.
    async fn vector_search(
        &self,
        _vector: &[f32],
        _options: &SearchOptions,
    ) -> ProviderResult<Vec<SearchResult>> {
        Err(ProviderError::Unsupported {
            operation: "vector_search".to_string(),
            reason: format!("{} does not support vector search", self.name()),
        })
    }

    /// Ingest documents into this provider's index. Providers that are
    /// read-only sources return `ProviderError::Unsupported`.
    async fn index(&self, _documents: &[JsonMap], _index_name: Option<&str>) -> ProviderResult<()> {
        Err(ProviderError::Unsupported {
            operation: "index".to_string(),
            reason: format!("{} does not support indexing", self.name()),
        })
    }

    /// Lightweight liveness/latency probe used by the provider manager's
    /// health-monitoring loop.
    async fn health_check(&self) -> ProviderResult<Duration>;
}

/// Convenience alias matching [`ProviderHealth`]'s construction pattern so
/// adapters don't need to import both modules.
pub type HealthProbe = ProviderHealth;
