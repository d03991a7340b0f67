//! # Router
//!
//! Orchestrates a request end to end: cache check, query enhancement,
//! provider selection, bounded concurrent fan-out, aggregation, and
//! response assembly. Grounded on the original gateway's `RouterService`
//! and the teacher's `MetaSearchClient::search` fan-out idiom
//! (semaphore-bounded `tokio::spawn` per provider, `tokio::time::timeout`
//! per call, error isolation so one failing provider doesn't fail the
//! whole request).

use crate::aggregator;
use crate::cache::{CacheManager, KeyInput};
use crate::manager::ProviderManager;
use crate::models::{
    ApiError, FusionMethod, HybridSearchRequest, HybridStrategyType, ProviderKind,
    ResponseMetadata, ResponseStatus, SearchOptions, SearchRequest, SearchResponse, SearchResult,
    VectorSearchRequest,
};
use crate::query::QueryProcessor;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;
use tracing::{error, warn};
use uuid::Uuid;

pub struct Router {
    providers: Arc<ProviderManager>,
    query_processor: Arc<QueryProcessor>,
    cache: Option<Arc<CacheManager>>,
    max_parallel_providers: usize,
}

impl Router {
    #[must_use]
    pub fn new(
        providers: Arc<ProviderManager>,
        query_processor: Arc<QueryProcessor>,
        max_parallel_providers: usize,
    ) -> Self {
        Self {
            providers,
            query_processor,
            cache: None,
            max_parallel_providers,
        }
    }

    #[must_use]
    pub fn with_cache(mut self, cache: Arc<CacheManager>) -> Self {
        self.cache = Some(cache);
        self
    }

    #[must_use]
    pub fn provider_manager(&self) -> &Arc<ProviderManager> {
        &self.providers
    }

    /// Standard keyword search: cache check, query processing, provider
    /// selection (with fallback retry), bounded fan-out, aggregate or
    /// rerank, filter, truncate, cache store.
    pub async fn search(&self, request: &SearchRequest) -> SearchResponse {
        let request_id = Uuid::new_v4().to_string();
        let start = Instant::now();
        let options = request.options.clone().unwrap_or_default().normalized();
        let providers = request.provider.as_list();

        if let Some(cache) = &self.cache {
            if let Some(mut cached) = cache
                .get(&providers, KeyInput::Query(&request.query), request.options.as_ref())
                .await
            {
                cached.metadata.cache_hit = true;
                return cached;
            }
        }

        let processed = self.query_processor.process(&request.query).await;

        let mut available = self.providers.available_providers(&providers, None).await;
        if available.is_empty() {
            if let Some(fallback) = &options.fallback_providers {
                available = self.providers.available_providers(fallback, None).await;
            }
        }

        if available.is_empty() {
            return error_response(&request_id, "no available providers", start);
        }

        let query_text = processed.effective_query().to_string();
        let outcomes = fan_out_search(
            &self.providers,
            &available,
            &query_text,
            &options,
            self.max_parallel_providers,
        )
        .await;

        let (mut all_results, successful, failed) = collect_outcomes(outcomes);

        let mut final_results = if options.rerank {
            aggregator::rerank(all_results, &query_text)
        } else {
            aggregator::aggregate(std::mem::take(&mut all_results), options.deduplicate)
        };

        if let Some(min_score) = options.min_score {
            final_results.retain(|r| r.score >= min_score);
        }
        final_results.truncate(options.limit as usize);

        let status = if failed.is_empty() {
            ResponseStatus::Success
        } else {
            ResponseStatus::Partial
        };

        let filters_applied = processed
            .filters
            .as_ref()
            .map(|f| f.keys().cloned().collect());

        let providers_failed = failed_provider_names(&failed);
        let errors = (!failed.is_empty()).then_some(failed);

        let response = SearchResponse {
            status,
            request_id: request_id.clone(),
            results: final_results,
            metadata: ResponseMetadata {
                total_results: None,
                query_time_ms: start.elapsed().as_millis() as u64,
                providers_used: successful.clone(),
                providers_failed,
                cache_hit: false,
                transformations_applied: None,
                filters_applied,
                spell_corrected: processed.corrected.is_some(),
            },
            errors,
            provider_used: (successful.len() == 1).then(|| successful[0].clone()),
            query_id: Some(request_id),
        };

        if let Some(cache) = &self.cache {
            cache
                .set(&providers, KeyInput::Query(&request.query), request.options.as_ref(), &response)
                .await;
        }

        response
    }

    /// Vector search: resolves a vector from the request or by embedding
    /// its text, fans out to vector-kind providers only, aggregates
    /// without rerank. Shares cache check/store and the min-score/limit
    /// steps with `search()`; only provider selection and fan-out differ.
    pub async fn vector_search(&self, request: &VectorSearchRequest) -> SearchResponse {
        let request_id = Uuid::new_v4().to_string();
        let start = Instant::now();
        let options = request.options.clone().unwrap_or_default().normalized();
        let providers = request.provider.as_list();

        let vector = match (&request.vector, &request.text) {
            (Some(v), _) => v.clone(),
            (None, Some(text)) => self.query_processor.generate_embedding(text),
            (None, None) => {
                return error_response(&request_id, "no vector or text provided", start);
            }
        };

        if let Some(cache) = &self.cache {
            if let Some(mut cached) = cache
                .get(&providers, KeyInput::Vector(&vector), request.options.as_ref())
                .await
            {
                cached.metadata.cache_hit = true;
                return cached;
            }
        }

        let available = self
            .providers
            .available_providers(&providers, Some(ProviderKind::VectorDb))
            .await;

        let outcomes = fan_out_vector_search(
            &self.providers,
            &available,
            &vector,
            &options,
            self.max_parallel_providers,
        )
        .await;
        let (all_results, successful, failed) = collect_outcomes(outcomes);
        let mut final_results = aggregator::aggregate(all_results, options.deduplicate);

        if let Some(min_score) = options.min_score {
            final_results.retain(|r| r.score >= min_score);
        }
        final_results.truncate(options.limit as usize);

        let providers_failed = failed_provider_names(&failed);
        let errors = (!failed.is_empty()).then_some(failed);

        let response = SearchResponse {
            status: if errors.is_none() {
                ResponseStatus::Success
            } else {
                ResponseStatus::Partial
            },
            request_id: request_id.clone(),
            results: final_results,
            metadata: ResponseMetadata {
                total_results: None,
                query_time_ms: start.elapsed().as_millis() as u64,
                providers_used: successful,
                providers_failed,
                cache_hit: false,
                transformations_applied: None,
                filters_applied: None,
                spell_corrected: false,
            },
            errors,
            provider_used: None,
            query_id: Some(request_id),
        };

        if let Some(cache) = &self.cache {
            cache
                .set(&providers, KeyInput::Vector(&vector), request.options.as_ref(), &response)
                .await;
        }

        response
    }

    /// Hybrid search: executes each strategy (keyword or vector,
    /// weight-scaled) concurrently, fuses with the requested method.
    /// Shares cache check/store and the min-score/limit steps with
    /// `search()`; `request.options` governs those shared steps while
    /// each strategy's own `options` governs its individual dispatch.
    pub async fn hybrid_search(&self, request: &HybridSearchRequest) -> SearchResponse {
        let request_id = Uuid::new_v4().to_string();
        let start = Instant::now();
        let options = request.options.clone().unwrap_or_default().normalized();
        let providers: Vec<String> = request.strategies.iter().map(|s| s.provider.clone()).collect();
        let cache_key_input = serde_json::to_string(&request.strategies).unwrap_or_default();

        if let Some(cache) = &self.cache {
            if let Some(mut cached) = cache
                .get(&providers, KeyInput::Composite(&cache_key_input), request.options.as_ref())
                .await
            {
                cached.metadata.cache_hit = true;
                return cached;
            }
        }

        let mut providers_used = Vec::new();
        let mut failed: Vec<ApiError> = Vec::new();
        let mut tasks = Vec::new();

        for strategy in &request.strategies {
            providers_used.push(strategy.provider.clone());
            let Some(adapter) = self.providers.adapter(&strategy.provider) else {
                failed.push(ApiError {
                    message: "provider not registered".to_string(),
                    provider: Some(strategy.provider.clone()),
                });
                continue;
            };
            let weight = strategy.weight;
            let strategy_options = strategy.options.clone().unwrap_or_default().normalized();
            let timeout = Duration::from_millis(strategy_options.timeout_ms);
            let manager = Arc::clone(&self.providers);
            let name = strategy.provider.clone();

            match strategy.kind {
                HybridStrategyType::Keyword => {
                    let query = strategy.query.clone().unwrap_or_default();
                    tasks.push(tokio::spawn(async move {
                        let result = manager
                            .call_guarded(&name, timeout, || async {
                                adapter.search(&query, &strategy_options).await.map_err(Into::into)
                            })
                            .await
                            .map(|mut results| {
                                for r in &mut results {
                                    r.score *= weight;
                                }
                                results
                            });
                        (name, result)
                    }));
                }
                HybridStrategyType::Vector => {
                    let vector = if let Some(v) = &strategy.vector {
                        v.clone()
                    } else if let Some(text) = &strategy.text {
                        self.query_processor.generate_embedding(text)
                    } else {
                        failed.push(ApiError {
                            message: "no vector or text provided for vector strategy".to_string(),
                            provider: Some(name),
                        });
                        continue;
                    };
                    tasks.push(tokio::spawn(async move {
                        let result = manager
                            .call_guarded(&name, timeout, || async {
                                adapter
                                    .vector_search(&vector, &strategy_options)
                                    .await
                                    .map_err(Into::into)
                            })
                            .await
                            .map(|mut results| {
                                for r in &mut results {
                                    r.score *= weight;
                                }
                                results
                            });
                        (name, result)
                    }));
                }
            }
        }

        let mut result_lists = Vec::new();
        for task in tasks {
            match task.await {
                Ok((_, Ok(results))) => result_lists.push(results),
                Ok((name, Err(e))) => {
                    warn!(provider = %name, error = %e, "hybrid strategy provider failed");
                    failed.push(ApiError {
                        message: e.to_string(),
                        provider: Some(name),
                    });
                }
                Err(e) => error!(error = %e, "hybrid strategy task panicked"),
            }
        }

        let mut final_results = match request.fusion_method {
            FusionMethod::ReciprocalRank => aggregator::reciprocal_rank_fusion(result_lists, 60),
            FusionMethod::WeightedSum => aggregator::weighted_sum_fusion(result_lists),
            FusionMethod::MaxScore => aggregator::max_score_fusion(result_lists),
        };

        if let Some(min_score) = options.min_score {
            final_results.retain(|r| r.score >= min_score);
        }
        final_results.truncate(options.limit as usize);

        let providers_failed = failed_provider_names(&failed);
        let errors = (!failed.is_empty()).then_some(failed);

        let response = SearchResponse {
            status: if errors.is_none() {
                ResponseStatus::Success
            } else {
                ResponseStatus::Partial
            },
            request_id: request_id.clone(),
            results: final_results,
            metadata: ResponseMetadata {
                total_results: None,
                query_time_ms: start.elapsed().as_millis() as u64,
                providers_used,
                providers_failed,
                cache_hit: false,
                transformations_applied: None,
                filters_applied: None,
                spell_corrected: false,
            },
            errors,
            provider_used: None,
            query_id: Some(request_id),
        };

        if let Some(cache) = &self.cache {
            cache
                .set(&providers, KeyInput::Composite(&cache_key_input), request.options.as_ref(), &response)
                .await;
        }

        response
    }
}

type ProviderOutcome = (String, crate::Result<Vec<SearchResult>>);

/// Bounded fan-out over keyword search: one semaphore permit and one
/// rate-limiter/circuit-breaker/timeout-guarded call per provider.
async fn fan_out_search(
    manager: &Arc<ProviderManager>,
    providers: &[Arc<dyn crate::adapters::ProviderAdapter>],
    query: &str,
    options: &SearchOptions,
    max_parallel: usize,
) -> Vec<ProviderOutcome> {
    let semaphore = Arc::new(Semaphore::new(max_parallel.max(1)));
    let timeout = Duration::from_millis(options.timeout_ms);
    let mut tasks = Vec::new();

    for provider in providers {
        let provider = Arc::clone(provider);
        let query = query.to_string();
        let options = options.clone();
        let semaphore = Arc::clone(&semaphore);
        let manager = Arc::clone(manager);

        tasks.push(tokio::spawn(async move {
            let _permit = semaphore.acquire_owned().await.unwrap();
            let name = provider.name().to_string();
            let result = manager
                .call_guarded(&name, timeout, || async {
                    provider.search(&query, &options).await.map_err(Into::into)
                })
                .await;
            (name, result)
        }));
    }

    join_all(tasks).await
}

async fn fan_out_vector_search(
    manager: &Arc<ProviderManager>,
    providers: &[Arc<dyn crate::adapters::ProviderAdapter>],
    vector: &[f32],
    options: &SearchOptions,
    max_parallel: usize,
) -> Vec<ProviderOutcome> {
    let semaphore = Arc::new(Semaphore::new(max_parallel.max(1)));
    let timeout = Duration::from_millis(options.timeout_ms);
    let mut tasks = Vec::new();

    for provider in providers {
        let provider = Arc::clone(provider);
        let vector = vector.to_vec();
        let options = options.clone();
        let semaphore = Arc::clone(&semaphore);
        let manager = Arc::clone(manager);

        tasks.push(tokio::spawn(async move {
            let _permit = semaphore.acquire_owned().await.unwrap();
            let name = provider.name().to_string();
            let result = manager
                .call_guarded(&name, timeout, || async {
                    provider
                        .vector_search(&vector, &options)
                        .await
                        .map_err(Into::into)
                })
                .await;
            (name, result)
        }));
    }

    join_all(tasks).await
}

async fn join_all(
    tasks: Vec<tokio::task::JoinHandle<ProviderOutcome>>,
) -> Vec<ProviderOutcome> {
    let mut outcomes = Vec::with_capacity(tasks.len());
    for task in tasks {
        match task.await {
            Ok(outcome) => outcomes.push(outcome),
            Err(e) => error!(error = %e, "provider search task panicked"),
        }
    }
    outcomes
}

fn collect_outcomes(outcomes: Vec<ProviderOutcome>) -> (Vec<SearchResult>, Vec<String>, Vec<ApiError>) {
    let mut all_results = Vec::new();
    let mut successful = Vec::new();
    let mut failed = Vec::new();

    for (name, outcome) in outcomes {
        match outcome {
            Ok(results) => {
                all_results.extend(results);
                successful.push(name);
            }
            Err(e) => {
                warn!(provider = %name, error = %e, "provider search failed");
                failed.push(ApiError {
                    message: e.to_string(),
                    provider: Some(name),
                });
            }
        }
    }

    (all_results, successful, failed)
}

/// Provider names drawn from a failure list, for `ResponseMetadata.providers_failed`.
fn failed_provider_names(failed: &[ApiError]) -> Option<Vec<String>> {
    if failed.is_empty() {
        return None;
    }
    Some(failed.iter().filter_map(|e| e.provider.clone()).collect())
}

fn error_response(request_id: &str, message: &str, start: Instant) -> SearchResponse {
    SearchResponse {
        status: ResponseStatus::Error,
        request_id: request_id.to_string(),
        results: vec![],
        metadata: ResponseMetadata {
            total_results: Some(0),
            query_time_ms: start.elapsed().as_millis() as u64,
            providers_used: vec![],
            providers_failed: None,
            cache_hit: false,
            transformations_applied: None,
            filters_applied: None,
            spell_corrected: false,
        },
        errors: Some(vec![ApiError {
            message: message.to_string(),
            provider: None,
        }]),
        provider_used: None,
        query_id: Some(request_id.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::MockWebSearchProvider;
    use crate::models::ProviderSelector;
    use crate::resilience::circuit_breaker::CircuitBreakerConfig;

    async fn build_router() -> Router {
        let manager = Arc::new(ProviderManager::new(Duration::from_secs(3600)));
        manager
            .register(
                Arc::new(MockWebSearchProvider::new("web-a")),
                CircuitBreakerConfig::default(),
            )
            .await;
        let processor = Arc::new(QueryProcessor::new());
        Router::new(manager, processor, 8)
    }

    #[tokio::test]
    async fn search_returns_results_from_available_provider() {
        let router = build_router().await;
        let request = SearchRequest {
            provider: ProviderSelector::One("web-a".to_string()),
            query: "rust async runtime".to_string(),
            options: None,
            metadata: None,
        };

        let response = router.search(&request).await;
        assert_eq!(response.status, ResponseStatus::Success);
        assert!(!response.results.is_empty());
    }

    #[tokio::test]
    async fn search_with_no_matching_provider_errors() {
        let router = build_router().await;
        let request = SearchRequest {
            provider: ProviderSelector::One("missing".to_string()),
            query: "rust".to_string(),
            options: None,
            metadata: None,
        };

        let response = router.search(&request).await;
        assert_eq!(response.status, ResponseStatus::Error);
    }
}
