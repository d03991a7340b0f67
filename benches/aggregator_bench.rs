use criterion::{black_box, criterion_group, criterion_main, Criterion};
use uir_gateway::aggregator;
use uir_gateway::models::SearchResult;

fn make_results(provider: &str, count: usize) -> Vec<SearchResult> {
    (0..count)
        .map(|i| SearchResult {
            id: format!("{provider}-{i}"),
            title: Some(format!("result {i} from {provider}")),
            content: None,
            url: Some(format!("https://{provider}.example/{i}")),
            snippet: None,
            score: 1.0 - (i as f64 / count as f64),
            provider: provider.to_string(),
            metadata: None,
            highlights: None,
            explanation: None,
            vector: None,
        })
        .collect()
}

fn bench_aggregate(c: &mut Criterion) {
    let results = make_results("web-a", 500);
    c.bench_function("aggregate_500_with_dedup", |b| {
        b.iter(|| aggregator::aggregate(black_box(results.clone()), true));
    });
}

fn bench_reciprocal_rank_fusion(c: &mut Criterion) {
    let lists = vec![make_results("web-a", 200), make_results("web-b", 200)];
    c.bench_function("reciprocal_rank_fusion_two_lists", |b| {
        b.iter(|| aggregator::reciprocal_rank_fusion(black_box(lists.clone()), 60));
    });
}

fn bench_rerank(c: &mut Criterion) {
    let results = make_results("web-a", 300);
    c.bench_function("rerank_300_results", |b| {
        b.iter(|| aggregator::rerank(black_box(results.clone()), "result from web"));
    });
}

criterion_group!(
    benches,
    bench_aggregate,
    bench_reciprocal_rank_fusion,
    bench_rerank
);
criterion_main!(benches);
