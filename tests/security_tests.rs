//! Input-hardening tests: adversarial and malformed queries must never
//! panic or escape their provider boundary, regardless of payload.

use std::sync::Arc;
use std::time::Duration;
use uir_gateway::adapters::MockWebSearchProvider;
use uir_gateway::manager::ProviderManager;
use uir_gateway::models::{ProviderSelector, SearchRequest};
use uir_gateway::query::QueryProcessor;
use uir_gateway::router::Router;

const ADVERSARIAL_PAYLOADS: &[&str] = &[
    "'; DROP TABLE results; --",
    "' OR 1=1 --",
    "<script>alert(1)</script>",
    "../../../../etc/passwd",
    "$(rm -rf /)",
    "\u{0}\u{0}\u{0}",
    "",
    "a very very very very very very very very very very very very long query that keeps going",
];

async fn test_router() -> Router {
    let manager = Arc::new(ProviderManager::new(Duration::from_secs(3600)));
    manager
        .register(
            Arc::new(MockWebSearchProvider::new("web-a")),
            Default::default(),
        )
        .await;
    Router::new(manager, Arc::new(QueryProcessor::new()), 4)
}

#[tokio::test]
async fn adversarial_queries_never_panic_the_router() {
    let router = test_router().await;

    for payload in ADVERSARIAL_PAYLOADS {
        let request = SearchRequest {
            provider: ProviderSelector::One("web-a".to_string()),
            query: (*payload).to_string(),
            options: None,
            metadata: None,
        };
        let response = router.search(&request).await;
        assert!(matches!(
            response.status,
            uir_gateway::models::ResponseStatus::Success
                | uir_gateway::models::ResponseStatus::Partial
                | uir_gateway::models::ResponseStatus::Error
        ));
    }
}

#[tokio::test]
async fn query_processing_handles_adversarial_text_without_panicking() {
    let processor = QueryProcessor::new();
    for payload in ADVERSARIAL_PAYLOADS {
        let processed = processor.process(payload).await;
        assert_eq!(processed.original, *payload);
    }
}

#[test]
fn entity_extraction_is_safe_on_malformed_unicode() {
    let payloads = ["\u{FEFF}\u{200B}", "𝔘𝔫𝔦𝔠𝔬𝔡𝔢", "\\x00\\x01\\x02"];
    for payload in payloads {
        let _ = uir_gateway::query::entities::extract(payload);
    }
}

#[test]
fn spell_correction_is_safe_on_malformed_unicode() {
    let payloads = ["\u{FEFF}\u{200B}", "𝔘𝔫𝔦𝔠𝔬𝔡𝔢"];
    for payload in payloads {
        let _ = uir_gateway::query::spell::correct(payload);
    }
}

#[test]
fn cache_key_generation_does_not_leak_unbounded_memory_for_huge_vectors() {
    let huge_vector: Vec<f32> = vec![0.0; 100_000];
    let key = uir_gateway::cache::key::build(
        &["p".to_string()],
        uir_gateway::cache::key::KeyInput::Vector(&huge_vector),
        None,
        None,
    );
    // Only the first 10 dimensions are hashed, so the key stays small
    // regardless of vector size.
    assert!(key.len() < 200);
}
