use std::sync::Arc;
use std::time::Duration;
use uir_gateway::adapters::{MockVectorDbProvider, MockWebSearchProvider};
use uir_gateway::cache::CacheManager;
use uir_gateway::models::{
    CacheOptions, FusionMethod, HybridSearchRequest, HybridStrategy, HybridStrategyType,
    ProviderSelector, SearchOptions, SearchRequest, VectorSearchRequest,
};
use uir_gateway::query::QueryProcessor;
use uir_gateway::repositories::InMemoryCacheRepository;
use uir_gateway::{Config, ProviderManager, Router};

async fn test_router() -> Router {
    let manager = Arc::new(ProviderManager::new(Duration::from_secs(3600)));
    manager
        .register(
            Arc::new(MockWebSearchProvider::new("web-a")),
            Default::default(),
        )
        .await;
    manager
        .register(
            Arc::new(MockVectorDbProvider::new("vector-a")),
            Default::default(),
        )
        .await;

    let processor = Arc::new(QueryProcessor::new());
    let cache = Arc::new(CacheManager::new(
        Arc::new(InMemoryCacheRepository::with_config(
            Duration::from_secs(60),
            1000,
        )),
        60,
    ));

    Router::new(manager, processor, 8).with_cache(cache)
}

#[tokio::test]
async fn config_defaults_are_sane() {
    let config = Config::default();
    assert_eq!(config.server.port, 8080);
    assert_eq!(config.resilience.failure_threshold, 5);
    assert_eq!(config.cache.local_default_ttl_secs, 3600);
}

#[tokio::test]
async fn end_to_end_search_returns_ranked_results() {
    let router = test_router().await;
    let request = SearchRequest {
        provider: ProviderSelector::One("web-a".to_string()),
        query: "neural network attention mechanism".to_string(),
        options: None,
        metadata: None,
    };

    let response = router.search(&request).await;
    assert!(!response.results.is_empty());
    for pair in response.results.windows(2) {
        assert!(pair[0].score >= pair[1].score);
    }
}

#[tokio::test]
async fn search_result_is_served_from_cache_on_second_call() {
    let router = test_router().await;
    let options = SearchOptions {
        cache: Some(CacheOptions {
            enabled: true,
            ttl_seconds: 60,
            key: None,
        }),
        ..Default::default()
    };
    let request = SearchRequest {
        provider: ProviderSelector::One("web-a".to_string()),
        query: "transformer architectures".to_string(),
        options: Some(options),
        metadata: None,
    };

    let first = router.search(&request).await;
    assert!(!first.metadata.cache_hit);

    let second = router.search(&request).await;
    assert!(second.metadata.cache_hit);
    assert_eq!(first.results.len(), second.results.len());
}

#[tokio::test]
async fn vector_search_embeds_text_when_no_vector_given() {
    let router = test_router().await;
    let request = VectorSearchRequest {
        provider: ProviderSelector::One("vector-a".to_string()),
        vector: None,
        text: Some("semantic document retrieval".to_string()),
        index: None,
        namespace: None,
        options: None,
    };

    let response = router.vector_search(&request).await;
    assert_eq!(response.status, uir_gateway::models::ResponseStatus::Success);
}

#[tokio::test]
async fn hybrid_search_fuses_keyword_and_vector_strategies() {
    let router = test_router().await;
    let request = HybridSearchRequest {
        strategies: vec![
            HybridStrategy {
                kind: HybridStrategyType::Keyword,
                provider: "web-a".to_string(),
                weight: 1.0,
                query: Some("machine learning".to_string()),
                text: None,
                vector: None,
                options: None,
            },
            HybridStrategy {
                kind: HybridStrategyType::Vector,
                provider: "vector-a".to_string(),
                weight: 0.8,
                query: None,
                text: Some("machine learning".to_string()),
                vector: None,
                options: None,
            },
        ],
        fusion_method: FusionMethod::ReciprocalRank,
        options: None,
    };

    let response = router.hybrid_search(&request).await;
    assert!(!response.results.is_empty());
}

#[tokio::test]
async fn search_with_unregistered_provider_returns_error_status() {
    let router = test_router().await;
    let request = SearchRequest {
        provider: ProviderSelector::One("does-not-exist".to_string()),
        query: "anything".to_string(),
        options: None,
        metadata: None,
    };

    let response = router.search(&request).await;
    assert_eq!(response.status, uir_gateway::models::ResponseStatus::Error);
    assert!(response.errors.is_some());
}

#[tokio::test]
async fn search_respects_provider_kind_filter_in_vector_search() {
    let router = test_router().await;
    let request = VectorSearchRequest {
        provider: ProviderSelector::Many(vec!["web-a".to_string(), "vector-a".to_string()]),
        vector: Some(vec![0.1; 768]),
        text: None,
        index: None,
        namespace: None,
        options: None,
    };

    let response = router.vector_search(&request).await;
    assert!(response
        .metadata
        .providers_used
        .iter()
        .all(|p| p != "web-a"));
}
