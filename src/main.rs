//! Gateway binary entrypoint: parses CLI flags, loads configuration,
//! wires the provider manager, query processor, cache, router, and health
//! checks together, and runs the HTTP server until a shutdown signal
//! arrives.

use clap::Parser;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};
use uir_gateway::adapters::{MockDocumentStoreProvider, MockVectorDbProvider, MockWebSearchProvider};
use uir_gateway::cache::CacheManager;
use uir_gateway::config::ConfigOverrides;
use uir_gateway::query::QueryProcessor;
use uir_gateway::repositories::InMemoryCacheRepository;
use uir_gateway::resilience::circuit_breaker::CircuitBreakerConfig;
use uir_gateway::resilience::health::{HealthCheckManager, PingHealthCheck};
use uir_gateway::{Config, ProviderManager, Router, Server};

#[derive(Parser, Debug)]
#[command(name = "uir-gateway", about = "Universal information-retrieval gateway")]
struct Cli {
    /// Path to a TOML configuration file.
    #[arg(short, long)]
    config: Option<String>,

    /// Override the HTTP bind address.
    #[arg(long)]
    bind_address: Option<String>,

    /// Override the HTTP port.
    #[arg(short, long)]
    port: Option<u16>,
}

/// Reads a provider's configured `requests_per_second`/`burst` rate-limit
/// pair out of `providers.<name>.rate_limits`, if present.
fn rate_limit_for(config: &Config, name: &str) -> Option<(f64, f64)> {
    let rate_limits = &config.providers.get(name)?.rate_limits;
    let refill_rate = f64::from(*rate_limits.get("requests_per_second")?);
    let capacity = rate_limits
        .get("burst")
        .map_or(refill_rate, |b| f64::from(*b));
    Some((capacity, refill_rate))
}

/// A provider's configured circuit breaker, falling back to the
/// deployment-wide default when it hasn't set its own.
fn circuit_breaker_config_for(config: &Config, name: &str) -> CircuitBreakerConfig {
    config
        .providers
        .get(name)
        .and_then(|p| p.circuit_breaker_config.clone())
        .unwrap_or_else(|| config.resilience.circuit_breaker_config())
}

fn init_tracing(config: &uir_gateway::config::LoggingConfig) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.level));

    let subscriber = tracing_subscriber::fmt().with_env_filter(filter);
    if config.json {
        subscriber.json().init();
    } else {
        subscriber.init();
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let overrides = ConfigOverrides {
        bind_address: cli.bind_address,
        port: cli.port,
        config_file: cli.config,
    };

    let config = match Config::load(&overrides) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("failed to load configuration: {e}");
            std::process::exit(1);
        }
    };

    init_tracing(&config.logging);
    info!("uir-gateway starting up");

    let config = Arc::new(config);
    let manager = Arc::new(ProviderManager::new(Duration::from_secs(30)));

    let retry_policy_for =
        |name: &str| config.providers.get(name).map(|p| p.retry_policy.clone());

    manager
        .register_full(
            Arc::new(MockWebSearchProvider::new("web-search")),
            circuit_breaker_config_for(&config, "web-search"),
            rate_limit_for(&config, "web-search"),
            retry_policy_for("web-search"),
        )
        .await;
    manager
        .register_full(
            Arc::new(MockVectorDbProvider::new("vector-db")),
            circuit_breaker_config_for(&config, "vector-db"),
            rate_limit_for(&config, "vector-db"),
            retry_policy_for("vector-db"),
        )
        .await;
    manager
        .register_full(
            Arc::new(MockDocumentStoreProvider::new("document-store")),
            circuit_breaker_config_for(&config, "document-store"),
            rate_limit_for(&config, "document-store"),
            retry_policy_for("document-store"),
        )
        .await;
    manager.start_health_monitor().await;

    let query_processor = Arc::new(QueryProcessor::new());

    let local_cache = Arc::new(InMemoryCacheRepository::with_config(
        Duration::from_secs(config.cache.local_default_ttl_secs),
        config.cache.local_max_entries,
    ));
    let mut cache_manager = CacheManager::new(local_cache, config.cache.local_default_ttl_secs);
    if let Some(path) = &config.cache.remote_path {
        match uir_gateway::cache::SledRemoteCache::open(path) {
            Ok(remote) => cache_manager = cache_manager.with_remote(Arc::new(remote)),
            Err(e) => error!(error = %e, "failed to open remote cache, continuing without it"),
        }
    }

    let router = Arc::new(
        Router::new(
            Arc::clone(&manager),
            query_processor,
            config.server.max_parallel_providers,
        )
        .with_cache(Arc::new(cache_manager)),
    );

    let health = Arc::new(HealthCheckManager::new());
    health
        .register(Arc::new(PingHealthCheck::new("gateway")))
        .await;

    let server = Server::new(Arc::clone(&config), router, health);

    if let Err(e) = server.run().await {
        error!(error = %e, "gateway server exited with an error");
        std::process::exit(1);
    }

    info!("uir-gateway shut down");
}
