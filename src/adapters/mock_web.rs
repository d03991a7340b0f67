//! A deterministic keyword-search adapter.
//!
//! Production deployments would point this at a real search engine's HTTP
//! API; in the absence of one, results are generated deterministically from
//! the query so the router, aggregator, and cache can be exercised and
//! tested end to end without a network dependency.

use super::traits::{ProviderAdapter, ProviderError, ProviderResult};
use crate::models::{JsonMap, ProviderKind, SearchOptions, SearchResult};
use async_trait::async_trait;
use sha2::{Digest, Sha256};
use std::time::Duration;

pub struct MockWebSearchProvider {
    name: String,
    priority: u8,
}

impl MockWebSearchProvider {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            priority: 100,
        }
    }

    #[must_use]
    pub const fn with_priority(mut self, priority: u8) -> Self {
        self.priority = priority;
        self
    }
}

#[async_trait]
impl ProviderAdapter for MockWebSearchProvider {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> ProviderKind {
        ProviderKind::WebSearch
    }

    fn priority(&self) -> u8 {
        self.priority
    }

    async fn search(
        &self,
        query: &str,
        options: &SearchOptions,
    ) -> ProviderResult<Vec<SearchResult>> {
        if query.trim().is_empty() {
            return Err(ProviderError::InvalidQuery("empty query".to_string()));
        }

        let count = options.limit.min(20) as usize;
        let mut results = Vec::with_capacity(count);
        for rank in 0..count {
            let mut hasher = Sha256::new();
            hasher.update(self.name.as_bytes());
            hasher.update(query.as_bytes());
            hasher.update(rank.to_le_bytes());
            let digest = hasher.finalize();
            let id = digest[..8]
                .iter()
                .map(|b| format!("{b:02x}"))
                .collect::<String>();

            // Score decays with rank, seeded by the digest so it's stable
            // across repeated calls with the same query.
            let score = 1.0 - (rank as f64 * 0.05) - (f64::from(digest[0]) / 255.0) * 0.05;

            results.push(SearchResult {
                id: format!("{}:{}", self.name, id),
                title: Some(format!("{query} — result {}", rank + 1)),
                content: Some(format!("Synthesized content for '{query}' from {}", self.name)),
                url: Some(format!("https://{}.example/doc/{id}", self.name)),
                snippet: Some(format!("...{query}...")),
                score: score.max(0.0),
                provider: self.name.clone(),
                metadata: None,
                highlights: None,
                explanation: None,
                vector: None,
            });
        }

        Ok(results)
    }

    async fn index(&self, _documents: &[JsonMap], _index_name: Option<&str>) -> ProviderResult<()> {
        Err(ProviderError::Unsupported {
            operation: "index".to_string(),
            reason: format!("{} is a read-only web search provider", self.name),
        })
    }

    async fn health_check(&self) -> ProviderResult<Duration> {
        Ok(Duration::from_millis(5))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn search_is_deterministic_for_the_same_query() {
        let provider = MockWebSearchProvider::new("web-a");
        let options = SearchOptions::default();

        let first = provider.search("rust async", &options).await.unwrap();
        let second = provider.search("rust async", &options).await.unwrap();

        assert_eq!(
            first.iter().map(|r| r.id.clone()).collect::<Vec<_>>(),
            second.iter().map(|r| r.id.clone()).collect::<Vec<_>>()
        );
    }

    #[tokio::test]
    async fn empty_query_is_rejected() {
        let provider = MockWebSearchProvider::new("web-a");
        let err = provider.search("", &SearchOptions::default()).await;
        assert!(matches!(err, Err(ProviderError::InvalidQuery(_))));
    }
}
