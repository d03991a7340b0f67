//! A deterministic vector-database adapter.
//!
//! Stands in for a real vector store (Pinecone, Qdrant, ...): holds an
//! in-memory set of indexed vectors and serves k-nearest-neighbor queries by
//! cosine similarity. Production deployments swap this for an adapter that
//! calls the vector database's wire API; the [`ProviderAdapter`] contract is
//! unchanged either way.

use super::traits::{ProviderAdapter, ProviderError, ProviderResult};
use crate::models::{JsonMap, ProviderKind, SearchOptions, SearchResult};
use async_trait::async_trait;
use std::sync::RwLock;
use std::time::Duration;

struct IndexedVector {
    id: String,
    vector: Vec<f32>,
    metadata: Option<JsonMap>,
}

pub struct MockVectorDbProvider {
    name: String,
    priority: u8,
    store: RwLock<Vec<IndexedVector>>,
}

impl MockVectorDbProvider {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            priority: 100,
            store: RwLock::new(Vec::new()),
        }
    }

    fn cosine_similarity(a: &[f32], b: &[f32]) -> f64 {
        if a.len() != b.len() || a.is_empty() {
            return 0.0;
        }
        let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
        let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
        let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm_a == 0.0 || norm_b == 0.0 {
            0.0
        } else {
            f64::from(dot / (norm_a * norm_b))
        }
    }
}

#[async_trait]
impl ProviderAdapter for MockVectorDbProvider {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> ProviderKind {
        ProviderKind::VectorDb
    }

    fn priority(&self) -> u8 {
        self.priority
    }

    async fn search(
        &self,
        _query: &str,
        _options: &SearchOptions,
    ) -> ProviderResult<Vec<SearchResult>> {
        Err(ProviderError::Unsupported {
            operation: "search".to_string(),
            reason: format!("{} only supports vector search", self.name),
        })
    }

    async fn vector_search(
        &self,
        vector: &[f32],
        options: &SearchOptions,
    ) -> ProviderResult<Vec<SearchResult>> {
        if vector.is_empty() {
            return Err(ProviderError::InvalidQuery("empty vector".to_string()));
        }

        let store = self
            .store
            .read()
            .map_err(|_| ProviderError::Other("index lock poisoned".to_string()))?;

        let mut scored: Vec<(f64, &IndexedVector)> = store
            .iter()
            .map(|entry| (Self::cosine_similarity(vector, &entry.vector), entry))
            .collect();
        scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(options.limit as usize);

        Ok(scored
            .into_iter()
            .map(|(score, entry)| SearchResult {
                id: entry.id.clone(),
                title: None,
                content: None,
                url: None,
                snippet: None,
                score,
                provider: self.name.clone(),
                metadata: entry.metadata.clone(),
                highlights: None,
                explanation: None,
                vector: Some(entry.vector.clone()),
            })
            .collect())
    }

    async fn index(&self, documents: &[JsonMap], _index_name: Option<&str>) -> ProviderResult<()> {
        let mut store = self
            .store
            .write()
            .map_err(|_| ProviderError::Other("index lock poisoned".to_string()))?;

        for (i, doc) in documents.iter().enumerate() {
            let vector = doc
                .get("vector")
                .and_then(|v| v.as_array())
                .map(|arr| {
                    arr.iter()
                        .filter_map(serde_json::Value::as_f64)
                        .map(|v| v as f32)
                        .collect::<Vec<f32>>()
                })
                .ok_or_else(|| ProviderError::Parse("document missing 'vector' field".to_string()))?;

            let id = doc
                .get("id")
                .and_then(|v| v.as_str())
                .map_or_else(|| format!("doc-{i}"), str::to_string);

            store.push(IndexedVector {
                id,
                vector,
                metadata: Some(doc.clone()),
            });
        }

        Ok(())
    }

    async fn health_check(&self) -> ProviderResult<Duration> {
        Ok(Duration::from_millis(2))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(id: &str, vector: Vec<f64>) -> JsonMap {
        let mut map = JsonMap::new();
        map.insert(
            "vector".to_string(),
            serde_json::Value::Array(
                vector
                    .into_iter()
                    .map(|v| serde_json::Number::from_f64(v).unwrap().into())
                    .collect(),
            ),
        );
        map.insert("id".to_string(), serde_json::Value::String(id.to_string()));
        map
    }

    #[tokio::test]
    async fn finds_nearest_neighbor() {
        let provider = MockVectorDbProvider::new("vec-a");
        provider
            .index(
                &[doc("match", vec![1.0, 0.0]), doc("other", vec![0.0, 1.0])],
                None,
            )
            .await
            .unwrap();

        let results = provider
            .vector_search(&[1.0, 0.0], &SearchOptions::default())
            .await
            .unwrap();

        assert_eq!(results[0].id, "match");
        assert!(results[0].score > results[1].score);
    }

    #[tokio::test]
    async fn keyword_search_is_unsupported() {
        let provider = MockVectorDbProvider::new("vec-a");
        let err = provider.search("anything", &SearchOptions::default()).await;
        assert!(matches!(err, Err(ProviderError::Unsupported { .. })));
    }
}
