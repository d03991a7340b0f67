//! # Query Processor
//!
//! Enhances a raw query before it reaches the router: spell correction,
//! entity extraction, intent classification, and keyword extraction run
//! concurrently (`tokio::join!`, mirroring the original's `asyncio.gather`),
//! then the corrected query is expanded with synonyms and filters are
//! synthesized from whatever entities and intent were found.
//!
//! No teacher analog; grounded entirely on the original gateway's own
//! query-processing pipeline and its mock spell-checker, entity extractor,
//! and embedding service.

pub mod embedding;
pub mod entities;
pub mod expand;
pub mod filters;
pub mod intent;
pub mod keywords;
pub mod spell;

pub use embedding::EmbeddingService;
pub use entities::{Entity, EntityKind};
pub use intent::{Intent, IntentKind};

use crate::models::JsonMap;
use std::sync::Arc;

/// A query after every enhancement stage has run.
#[derive(Debug, Clone)]
pub struct ProcessedQuery {
    pub original: String,
    /// `Some` only when spell correction actually changed the query.
    pub corrected: Option<String>,
    pub expanded: String,
    pub entities: Vec<Entity>,
    pub intent: Intent,
    pub embedding: Vec<f32>,
    pub filters: Option<JsonMap>,
    pub keywords: Vec<String>,
}

impl ProcessedQuery {
    /// The query text downstream stages (provider search, caching) should
    /// actually use: the corrected form if correction changed anything,
    /// else the original.
    #[must_use]
    pub fn effective_query(&self) -> &str {
        self.corrected.as_deref().unwrap_or(&self.original)
    }
}

/// Coordinates spell correction, entity extraction, intent classification,
/// keyword extraction, query expansion, embedding, and filter synthesis.
pub struct QueryProcessor {
    embeddings: Arc<EmbeddingService>,
}

impl Default for QueryProcessor {
    fn default() -> Self {
        Self::new()
    }
}

impl QueryProcessor {
    #[must_use]
    pub fn new() -> Self {
        Self {
            embeddings: Arc::new(EmbeddingService::new()),
        }
    }

    #[must_use]
    pub fn with_embedding_service(embeddings: Arc<EmbeddingService>) -> Self {
        Self { embeddings }
    }

    /// Run every enhancement stage and assemble a [`ProcessedQuery`].
    pub async fn process(&self, query: &str) -> ProcessedQuery {
        let query_owned = query.to_string();
        let embeddings = Arc::clone(&self.embeddings);

        let (corrected, entities, intent, keywords, embedding) = tokio::join!(
            tokio::task::spawn_blocking({
                let q = query_owned.clone();
                move || spell::correct(&q)
            }),
            tokio::task::spawn_blocking({
                let q = query_owned.clone();
                move || entities::extract(&q)
            }),
            tokio::task::spawn_blocking({
                let q = query_owned.clone();
                move || intent::classify(&q)
            }),
            tokio::task::spawn_blocking({
                let q = query_owned.clone();
                move || keywords::extract(&q)
            }),
            tokio::task::spawn_blocking({
                let q = query_owned.clone();
                move || embeddings.embed(&q)
            }),
        );

        let corrected = corrected.unwrap_or_else(|_| query.to_string());
        let entities = entities.unwrap_or_default();
        let intent = intent.unwrap_or(Intent {
            kind: IntentKind::General,
            confidence: 0.0,
        });
        let keywords = keywords.unwrap_or_default();
        let embedding = embedding.unwrap_or_default();

        let corrected_opt = if corrected == query { None } else { Some(corrected) };
        let expand_base = corrected_opt.as_deref().unwrap_or(query);
        let expanded = expand::expand(expand_base, &entities);
        let filters = filters::generate(&entities, &intent);

        ProcessedQuery {
            original: query.to_string(),
            corrected: corrected_opt,
            expanded,
            entities,
            intent,
            embedding,
            filters,
            keywords,
        }
    }

    /// Generate an embedding for arbitrary text (used by vector/hybrid
    /// search when a request supplies text instead of a raw vector).
    #[must_use]
    pub fn generate_embedding(&self, text: &str) -> Vec<f32> {
        self.embeddings.embed(text)
    }

    /// Hash a query (plus optional filters) for cache-key generation.
    #[must_use]
    pub fn query_hash(query: &str, filters: Option<&JsonMap>) -> String {
        use sha2::{Digest, Sha256};

        let mut content = query.to_string();
        if let Some(filters) = filters {
            let mut entries: Vec<(String, String)> = filters
                .iter()
                .map(|(k, v)| (k.clone(), v.to_string()))
                .collect();
            entries.sort();
            content.push_str(&format!("{entries:?}"));
        }

        let digest = Sha256::digest(content.as_bytes());
        digest.iter().map(|b| format!("{b:02x}")).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn process_runs_all_stages() {
        let processor = QueryProcessor::new();
        let processed = processor
            .process("recent serch papers about transformer 2024-01-15")
            .await;

        assert!(processed.corrected.is_some());
        assert!(!processed.keywords.is_empty());
        assert_eq!(processed.embedding.len(), embedding::DIMENSION);
        assert!(processed.entities.iter().any(|e| e.kind == EntityKind::Date));
    }

    #[tokio::test]
    async fn unchanged_query_has_no_correction() {
        let processor = QueryProcessor::new();
        let processed = processor.process("hello world").await;
        assert!(processed.corrected.is_none());
        assert_eq!(processed.effective_query(), "hello world");
    }
}
