//! A deterministic document-store adapter (substring match over an
//! in-memory document set), standing in for a real document store
//! (Elasticsearch, a document database, ...).

use super::traits::{ProviderAdapter, ProviderError, ProviderResult};
use crate::models::{JsonMap, ProviderKind, SearchOptions, SearchResult};
use async_trait::async_trait;
use std::sync::RwLock;
use std::time::Duration;

struct StoredDocument {
    id: String,
    text: String,
    metadata: Option<JsonMap>,
}

pub struct MockDocumentStoreProvider {
    name: String,
    priority: u8,
    store: RwLock<Vec<StoredDocument>>,
}

impl MockDocumentStoreProvider {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            priority: 100,
            store: RwLock::new(Vec::new()),
        }
    }
}

#[async_trait]
impl ProviderAdapter for MockDocumentStoreProvider {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> ProviderKind {
        ProviderKind::DocumentStore
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

        let store = self
            .store
            .read()
            .map_err(|_| ProviderError::Other("store lock poisoned".to_string()))?;

        let query_lower = query.to_lowercase();
        let terms: Vec<&str> = query_lower.split_whitespace().collect();

        let mut matches: Vec<SearchResult> = store
            .iter()
            .filter_map(|doc| {
                let text_lower = doc.text.to_lowercase();
                let hits = terms.iter().filter(|t| text_lower.contains(*t)).count();
                if hits == 0 {
                    return None;
                }
                let score = hits as f64 / terms.len().max(1) as f64;
                Some(SearchResult {
                    id: doc.id.clone(),
                    title: None,
                    content: Some(doc.text.clone()),
                    url: None,
                    snippet: Some(doc.text.chars().take(160).collect()),
                    score,
                    provider: self.name.clone(),
                    metadata: doc.metadata.clone(),
                    highlights: None,
                    explanation: None,
                    vector: None,
                })
            })
            .collect();

        matches.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        matches.truncate(options.limit as usize);
        Ok(matches)
    }

    async fn index(&self, documents: &[JsonMap], _index_name: Option<&str>) -> ProviderResult<()> {
        let mut store = self
            .store
            .write()
            .map_err(|_| ProviderError::Other("store lock poisoned".to_string()))?;

        for (i, doc) in documents.iter().enumerate() {
            let text = doc
                .get("text")
                .and_then(|v| v.as_str())
                .ok_or_else(|| ProviderError::Parse("document missing 'text' field".to_string()))?
                .to_string();
            let id = doc
                .get("id")
                .and_then(|v| v.as_str())
                .map_or_else(|| format!("doc-{i}"), str::to_string);

            store.push(StoredDocument {
                id,
                text,
                metadata: Some(doc.clone()),
            });
        }

        Ok(())
    }

    async fn health_check(&self) -> ProviderResult<Duration> {
        Ok(Duration::from_millis(3))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(id: &str, text: &str) -> JsonMap {
        let mut map = JsonMap::new();
        map.insert("id".to_string(), serde_json::Value::String(id.to_string()));
        map.insert(
            "text".to_string(),
            serde_json::Value::String(text.to_string()),
        );
        map
    }

    #[tokio::test]
    async fn finds_substring_matches() {
        let provider = MockDocumentStoreProvider::new("docs-a");
        provider
            .index(
                &[
                    doc("1", "the quick brown fox"),
                    doc("2", "lorem ipsum dolor"),
                ],
                None,
            )
            .await
            .unwrap();

        let results = provider
            .search("quick fox", &SearchOptions::default())
            .await
            .unwrap();

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].id, "1");
    }
}
