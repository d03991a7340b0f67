//! # Configuration
//!
//! Layered configuration: defaults, overridden by an optional TOML file,
//! overridden by `UIR_`-prefixed environment variables, overridden by
//! explicit [`ConfigOverrides`] supplied at construction (typically from
//! CLI flags). Mirrors the teacher's `config`/`envy`/`toml` stack.

use crate::resilience::circuit_breaker::CircuitBreakerConfig;
use crate::resilience::retry::RetryConfig;
use crate::Result;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;
use tracing::{info, warn};

use crate::models::ProviderConfig;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub bind_address: String,
    pub port: u16,
    pub graceful_shutdown_timeout_secs: u64,
    pub max_parallel_providers: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0".to_string(),
            port: 8080,
            graceful_shutdown_timeout_secs: 10,
            max_parallel_providers: 8,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    pub local_max_entries: usize,
    pub local_default_ttl_secs: u64,
    pub remote_path: Option<String>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            local_max_entries: 10_000,
            local_default_ttl_secs: 3600,
            remote_path: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResilienceConfig {
    pub failure_threshold: u32,
    pub success_threshold: u32,
    pub recovery_timeout_secs: u64,
    pub half_open_max_calls: u32,
    pub max_retry_attempts: u32,
    pub default_timeout_ms: u64,
}

impl Default for ResilienceConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 5,
            success_threshold: 3,
            recovery_timeout_secs: 30,
            half_open_max_calls: 3,
            max_retry_attempts: 3,
            default_timeout_ms: 5000,
        }
    }
}

impl ResilienceConfig {
    #[must_use]
    pub fn circuit_breaker_config(&self) -> CircuitBreakerConfig {
        CircuitBreakerConfig {
            failure_threshold: self.failure_threshold,
            success_threshold: self.success_threshold,
            failure_timeout: Duration::from_secs(60),
            recovery_timeout: Duration::from_secs(self.recovery_timeout_secs),
            half_open_max_calls: self.half_open_max_calls,
        }
    }

    #[must_use]
    pub fn retry_config(&self) -> RetryConfig {
        RetryConfig {
            max_attempts: self.max_retry_attempts,
            ..RetryConfig::default()
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub resilience: ResilienceConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub providers: HashMap<String, ProviderConfig>,
}

/// Explicit overrides applied after file and environment layers, typically
/// populated from CLI flags.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub bind_address: Option<String>,
    pub port: Option<u16>,
    pub config_file: Option<String>,
}

impl Config {
    /// Load configuration from (in ascending priority): built-in defaults,
    /// an optional TOML file, `UIR_*` environment variables, then explicit
    /// overrides.
    pub fn load(overrides: &ConfigOverrides) -> Result<Self> {
        let mut builder = config::Config::builder()
            .add_source(config::Config::try_from(&Config::default())?);

        let file_path = overrides.config_file.as_deref().unwrap_or("config.toml");
        if Path::new(file_path).exists() {
            info!("loading configuration file {}", file_path);
            builder = builder.add_source(config::File::with_name(file_path));
        } else {
            warn!("no configuration file at {}, using defaults", file_path);
        }

        let settled = builder.build()?;
        let mut parsed: Self = settled.try_deserialize()?;

        if let Ok(env_overrides) = envy::prefixed("UIR_").from_env::<EnvOverrides>() {
            env_overrides.apply(&mut parsed);
        }

        if let Some(addr) = &overrides.bind_address {
            parsed.server.bind_address = addr.clone();
        }
        if let Some(port) = overrides.port {
            parsed.server.port = port;
        }

        Ok(parsed)
    }
}

/// Flat shape matched against `UIR_*` environment variables via `envy`;
/// `Config`'s nested sections don't map directly onto env-var prefixes, so
/// this is a thin intermediate layer applied back onto the parsed config.
#[derive(Debug, Default, Deserialize)]
struct EnvOverrides {
    bind_address: Option<String>,
    port: Option<u16>,
    log_level: Option<String>,
}

impl EnvOverrides {
    fn apply(self, config: &mut Config) {
        if let Some(addr) = self.bind_address {
            config.server.bind_address = addr;
        }
        if let Some(port) = self.port {
            config.server.port = port;
        }
        if let Some(level) = self.log_level {
            config.logging.level = level;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_has_sane_values() {
        let config = Config::default();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.resilience.failure_threshold, 5);
    }

    #[test]
    fn overrides_take_priority_over_defaults() {
        let overrides = ConfigOverrides {
            bind_address: Some("127.0.0.1".to_string()),
            port: Some(9999),
            config_file: Some("/nonexistent/path.toml".to_string()),
        };
        let config = Config::load(&overrides).expect("load should tolerate a missing file");
        assert_eq!(config.server.bind_address, "127.0.0.1");
        assert_eq!(config.server.port, 9999);
    }
}
