use criterion::{black_box, criterion_group, criterion_main, Criterion};
use std::sync::Arc;
use std::time::Duration;
use uir_gateway::adapters::MockWebSearchProvider;
use uir_gateway::manager::ProviderManager;
use uir_gateway::models::{ProviderSelector, SearchRequest};
use uir_gateway::query::QueryProcessor;
use uir_gateway::router::Router;

fn build_router(provider_count: usize) -> (tokio::runtime::Runtime, Router) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let manager = Arc::new(ProviderManager::new(Duration::from_secs(3600)));
    rt.block_on(async {
        for i in 0..provider_count {
            manager
                .register(
                    Arc::new(MockWebSearchProvider::new(format!("web-{i}"))),
                    Default::default(),
                )
                .await;
        }
    });
    let router = Router::new(manager, Arc::new(QueryProcessor::new()), 8);
    (rt, router)
}

fn bench_search_single_provider(c: &mut Criterion) {
    let (rt, router) = build_router(1);
    let request = SearchRequest {
        provider: ProviderSelector::One("web-0".to_string()),
        query: "attention is all you need".to_string(),
        options: None,
        metadata: None,
    };

    c.bench_function("search_single_provider", |b| {
        b.to_async(&rt)
            .iter(|| async { black_box(router.search(&request).await) });
    });
}

fn bench_search_fan_out_eight_providers(c: &mut Criterion) {
    let (rt, router) = build_router(8);
    let request = SearchRequest {
        provider: ProviderSelector::Many((0..8).map(|i| format!("web-{i}")).collect()),
        query: "attention is all you need".to_string(),
        options: None,
        metadata: None,
    };

    c.bench_function("search_fan_out_eight_providers", |b| {
        b.to_async(&rt)
            .iter(|| async { black_box(router.search(&request).await) });
    });
}

criterion_group!(
    benches,
    bench_search_single_provider,
    bench_search_fan_out_eight_providers
);
criterion_main!(benches);
