//! # Domain Model
//!
//! Provider-agnostic request/response types shared by the router, the
//! provider manager, the aggregator, and the HTTP surface. These mirror the
//! original gateway's request/response contract: a handful of request kinds
//! (keyword search, vector search, hybrid search) sharing one response
//! envelope, so callers never need to branch on which providers answered.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::SystemTime;

/// A JSON object used for free-form, provider-specific metadata.
pub type JsonMap = serde_json::Map<String, serde_json::Value>;

/// Selects one or many providers by name, mirroring the original's
/// `Union[str, List[str]]` provider field.
#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(untagged)]
pub enum ProviderSelector {
    One(String),
    Many(Vec<String>),
}

impl ProviderSelector {
    /// Normalize to a list of provider names.
    #[must_use]
    pub fn as_list(&self) -> Vec<String> {
        match self {
            Self::One(name) => vec![name.clone()],
            Self::Many(names) => names.clone(),
        }
    }
}

/// Coarse category a provider belongs to, used to route vector vs. keyword
/// vs. document-store requests to the right adapters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ProviderKind {
    WebSearch,
    VectorDb,
    DocumentStore,
}

#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct DateRange {
    pub start: Option<chrono::DateTime<chrono::Utc>>,
    pub end: Option<chrono::DateTime<chrono::Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct CacheOptions {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_cache_ttl")]
    pub ttl_seconds: u64,
    pub key: Option<String>,
}

impl Default for CacheOptions {
    fn default() -> Self {
        Self {
            enabled: true,
            ttl_seconds: default_cache_ttl(),
            key: None,
        }
    }
}

const fn default_cache_ttl() -> u64 {
    3600
}

const fn default_true() -> bool {
    true
}

const fn default_limit() -> u32 {
    10
}

const fn default_timeout_ms() -> u64 {
    5000
}

/// Per-request tuning knobs, mirroring the original's `SearchOptions`.
#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct SearchOptions {
    #[serde(default = "default_limit")]
    pub limit: u32,
    #[serde(default)]
    pub offset: u32,
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    pub filters: Option<JsonMap>,
    pub date_range: Option<DateRange>,
    #[serde(default = "default_true")]
    pub include_metadata: bool,
    #[serde(default)]
    pub include_explanation: bool,
    #[serde(default)]
    pub rerank: bool,
    pub cache: Option<CacheOptions>,
    pub fallback_providers: Option<Vec<String>>,
    pub min_score: Option<f64>,
    #[serde(default = "default_true")]
    pub deduplicate: bool,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            limit: default_limit(),
            offset: 0,
            timeout_ms: default_timeout_ms(),
            filters: None,
            date_range: None,
            include_metadata: true,
            include_explanation: false,
            rerank: false,
            cache: None,
            fallback_providers: None,
            min_score: None,
            deduplicate: true,
        }
    }
}

impl SearchOptions {
    /// Clamp `limit`/`timeout_ms` into the ranges the original enforced
    /// (1..=1000 results, 100ms..=60s timeout) so a caller-supplied value
    /// out of range degrades gracefully instead of rejecting the request.
    #[must_use]
    pub fn normalized(mut self) -> Self {
        self.limit = self.limit.clamp(1, 1000);
        self.timeout_ms = self.timeout_ms.clamp(100, 60_000);
        self
    }
}

/// A single normalized result, uniform across every provider kind.
#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct SearchResult {
    pub id: String,
    pub title: Option<String>,
    pub content: Option<String>,
    pub url: Option<String>,
    pub snippet: Option<String>,
    pub score: f64,
    pub provider: String,
    pub metadata: Option<JsonMap>,
    pub highlights: Option<Vec<String>>,
    pub explanation: Option<String>,
    pub vector: Option<Vec<f32>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ResponseStatus {
    Success,
    Partial,
    Error,
}

#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct ApiError {
    pub message: String,
    pub provider: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct ResponseMetadata {
    pub total_results: Option<u32>,
    pub query_time_ms: u64,
    pub providers_used: Vec<String>,
    pub providers_failed: Option<Vec<String>>,
    #[serde(default)]
    pub cache_hit: bool,
    pub transformations_applied: Option<Vec<String>>,
    pub filters_applied: Option<Vec<String>>,
    #[serde(default)]
    pub spell_corrected: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct SearchResponse {
    pub status: ResponseStatus,
    pub request_id: String,
    pub results: Vec<SearchResult>,
    pub metadata: ResponseMetadata,
    pub errors: Option<Vec<ApiError>>,
    pub provider_used: Option<String>,
    pub query_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct SearchRequest {
    pub provider: ProviderSelector,
    pub query: String,
    pub options: Option<SearchOptions>,
    pub metadata: Option<JsonMap>,
}

#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct VectorSearchRequest {
    pub provider: ProviderSelector,
    pub vector: Option<Vec<f32>>,
    pub text: Option<String>,
    pub index: Option<String>,
    pub namespace: Option<String>,
    pub options: Option<SearchOptions>,
}

/// Fusion algorithm used to combine a [`HybridSearchRequest`]'s per-strategy
/// result lists into one ranked list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum FusionMethod {
    ReciprocalRank,
    WeightedSum,
    MaxScore,
}

impl Default for FusionMethod {
    fn default() -> Self {
        Self::ReciprocalRank
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum HybridStrategyType {
    Keyword,
    Vector,
}

#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct HybridStrategy {
    #[serde(rename = "type")]
    pub kind: HybridStrategyType,
    pub provider: String,
    #[serde(default = "default_weight")]
    pub weight: f64,
    pub query: Option<String>,
    pub text: Option<String>,
    pub vector: Option<Vec<f32>>,
    pub options: Option<SearchOptions>,
}

const fn default_weight() -> f64 {
    1.0
}

#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct HybridSearchRequest {
    pub strategies: Vec<HybridStrategy>,
    #[serde(default)]
    pub fusion_method: FusionMethod,
    pub options: Option<SearchOptions>,
}

/// Document ingestion request, supplementing the distilled spec with the
/// original's indexing operation.
#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct IndexRequest {
    pub provider: String,
    pub documents: Vec<JsonMap>,
    pub index_name: Option<String>,
    pub options: Option<JsonMap>,
}

/// Static, per-provider configuration as held by the provider manager.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    pub name: String,
    pub kind: ProviderKind,
    pub auth_method: String,
    #[serde(default)]
    pub credentials: JsonMap,
    #[serde(default)]
    pub endpoints: HashMap<String, String>,
    #[serde(default)]
    pub rate_limits: HashMap<String, u32>,
    #[serde(default)]
    pub retry_policy: crate::resilience::retry::RetryConfig,
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    /// Relative priority when multiple providers can serve a request;
    /// lower values are tried first.
    #[serde(default = "default_priority")]
    pub priority: u8,
    #[serde(default)]
    pub circuit_breaker_config: Option<crate::resilience::circuit_breaker::CircuitBreakerConfig>,
}

const fn default_priority() -> u8 {
    100
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum HealthStatus {
    Healthy,
    Degraded,
    Unhealthy,
    Unknown,
}

#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct ProviderHealth {
    pub provider: String,
    pub status: HealthStatus,
    pub latency_ms: Option<f64>,
    pub success_rate: Option<f64>,
    #[serde(with = "chrono::serde::ts_seconds")]
    pub last_check: chrono::DateTime<chrono::Utc>,
    pub error_message: Option<String>,
}

impl ProviderHealth {
    #[must_use]
    pub fn unknown(provider: impl Into<String>) -> Self {
        Self {
            provider: provider.into(),
            status: HealthStatus::Unknown,
            latency_ms: None,
            success_rate: None,
            last_check: chrono::Utc::now(),
            error_message: None,
        }
    }
}

/// Aggregate usage counters, supplementing the distilled spec with the
/// original's `UsageMetrics` tracking (exposed via the `/metrics` surface).
#[derive(Debug, Clone, Default, Serialize, Deserialize, schemars::JsonSchema)]
pub struct UsageMetrics {
    pub total_requests: u64,
    pub by_provider: HashMap<String, u64>,
    pub by_operation: HashMap<String, u64>,
}

pub(crate) fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_selector_normalizes_both_shapes() {
        assert_eq!(
            ProviderSelector::One("a".into()).as_list(),
            vec!["a".to_string()]
        );
        assert_eq!(
            ProviderSelector::Many(vec!["a".into(), "b".into()]).as_list(),
            vec!["a".to_string(), "b".to_string()]
        );
    }

    #[test]
    fn search_options_normalizes_out_of_range_values() {
        let options = SearchOptions {
            limit: 5000,
            timeout_ms: 1,
            ..Default::default()
        }
        .normalized();
        assert_eq!(options.limit, 1000);
        assert_eq!(options.timeout_ms, 100);
    }

    #[test]
    fn search_options_deserializes_with_defaults() {
        let options: SearchOptions = serde_json::from_str("{}").unwrap();
        assert_eq!(options.limit, 10);
        assert!(options.deduplicate);
    }
}
