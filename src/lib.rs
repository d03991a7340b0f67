//! uir-gateway - a universal information-retrieval gateway
//!
//! Fronts a heterogeneous set of search, vector, and document-store
//! providers behind one HTTP API: a request is enhanced (spell-checked,
//! entity-tagged, embedded), fanned out to the selected providers with
//! bounded concurrency, aggregated or fused, cached, and returned as a
//! single normalized response.

pub mod adapters;
pub mod aggregator;
pub mod cache;
pub mod config;
pub mod error;
pub mod manager;
pub mod models;
pub mod query;
pub mod repositories;
pub mod resilience;
pub mod router;
pub mod server;

pub use config::{Config, ConfigOverrides};
pub use error::{Error, Result};
pub use manager::ProviderManager;
pub use repositories::{
    CacheEntry, CacheRepository, InMemoryCacheRepository, Repository, RepositoryError,
    RepositoryResult, RepositoryStats,
};
pub use resilience::health::HealthCheckManager;
pub use resilience::{CircuitBreaker, RetryConfig, RetryPolicy, TimeoutConfig, TimeoutExt};
pub use router::Router;
pub use server::Server;
