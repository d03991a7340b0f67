//! Deterministic text embeddings, standing in for a real embedding model.
//!
//! The original seeds numpy's PRNG from an MD5 prefix of the text; since
//! this crate already carries `sha2` rather than `md5`, the PRNG is seeded
//! from a SHA256 prefix instead. The seeding *source* (a hash of the text)
//! is preserved so the same text always yields the same vector — bit
//! identical output to the Python original is not the goal, only
//! determinism per text.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::sync::RwLock;

pub const DIMENSION: usize = 768;

const BOOSTS: &[(&str, usize, usize, f32)] = &[
    ("machine learning", 0, 50, 0.3),
    ("deep learning", 50, 100, 0.3),
    ("transformer", 100, 150, 0.4),
    ("attention", 150, 200, 0.35),
    ("neural", 200, 250, 0.3),
    ("search", 250, 300, 0.25),
    ("query", 300, 350, 0.25),
    ("document", 350, 400, 0.3),
    ("vector", 400, 450, 0.35),
    ("semantic", 450, 500, 0.4),
];

/// Deterministic embedding generator, memoizing by raw text like the
/// original's in-instance cache.
pub struct EmbeddingService {
    cache: RwLock<HashMap<String, Vec<f32>>>,
}

impl Default for EmbeddingService {
    fn default() -> Self {
        Self::new()
    }
}

impl EmbeddingService {
    #[must_use]
    pub fn new() -> Self {
        Self {
            cache: RwLock::new(HashMap::new()),
        }
    }

    #[must_use]
    pub fn embed(&self, text: &str) -> Vec<f32> {
        if let Some(cached) = self.cache.read().unwrap().get(text) {
            return cached.clone();
        }

        let embedding = generate(text);
        self.cache
            .write()
            .unwrap()
            .insert(text.to_string(), embedding.clone());
        embedding
    }

    #[must_use]
    pub fn embed_batch(&self, texts: &[String]) -> Vec<Vec<f32>> {
        texts.iter().map(|t| self.embed(t)).collect()
    }

    #[must_use]
    pub fn similarity(a: &[f32], b: &[f32]) -> f64 {
        cosine_similarity(a, b)
    }
}

fn generate(text: &str) -> Vec<f32> {
    let digest = Sha256::digest(text.as_bytes());
    let seed_bytes: [u8; 8] = digest[..8].try_into().unwrap();
    let seed = u64::from_be_bytes(seed_bytes);
    let mut rng = StdRng::seed_from_u64(seed);

    let mut embedding: Vec<f32> = (0..DIMENSION)
        .map(|_| rng.sample::<f32, _>(rand::distributions::Standard) * 0.5)
        .collect();

    let lower = text.to_lowercase();
    for (term, start, end, magnitude) in BOOSTS {
        if lower.contains(term) {
            for v in &mut embedding[*start..*end] {
                *v += magnitude;
            }
        }
    }

    let length_signal = text.len() as f32 / 100.0;
    for v in &mut embedding[500..510] {
        *v += length_signal;
    }

    let norm: f32 = embedding.iter().map(|v| v * v).sum::<f32>().sqrt();
    if norm > 0.0 {
        for v in &mut embedding {
            *v /= norm;
        }
    }

    embedding
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embedding_is_deterministic() {
        let service = EmbeddingService::new();
        let a = service.embed("transformer attention mechanism");
        let b = service.embed("transformer attention mechanism");
        assert_eq!(a, b);
    }

    #[test]
    fn embedding_has_expected_dimension_and_is_normalized() {
        let service = EmbeddingService::new();
        let v = service.embed("machine learning search query");
        assert_eq!(v.len(), DIMENSION);
        let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 0.01);
    }

    #[test]
    fn different_text_yields_different_embedding() {
        let service = EmbeddingService::new();
        assert_ne!(service.embed("alpha"), service.embed("beta"));
    }
}
