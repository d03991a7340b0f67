//! # Aggregator
//!
//! Combines, deduplicates, fuses, reranks, and diversifies search results
//! gathered from multiple providers. Grounded on the original gateway's
//! result aggregator; no teacher analog beyond the meta-search client's
//! much simpler title-based dedup pass, which this generalizes into the
//! original's full algorithm set.

use crate::models::SearchResult;
use indexmap::IndexMap;
use sha2::{Digest, Sha256};
use std::cmp::Ordering;
use std::collections::HashMap;
use url::Url;

/// Content hash used for dedup and fusion keying: SHA256 of the URL if
/// present (the original uses MD5; this crate already depends on `sha2`
/// for cache keys, so the same digest is reused here rather than adding a
/// second hashing crate), else of the concatenated title/content/snippet.
fn content_hash(result: &SearchResult) -> String {
    let mut hasher = Sha256::new();
    if let Some(url) = &result.url {
        hasher.update(url.as_bytes());
    } else {
        hasher.update(result.title.as_deref().unwrap_or(""));
        hasher.update(result.content.as_deref().unwrap_or(""));
        hasher.update(result.snippet.as_deref().unwrap_or(""));
    }
    hasher
        .finalize()
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect()
}

fn domain(result: &SearchResult) -> String {
    result
        .url
        .as_deref()
        .and_then(|u| Url::parse(u).ok())
        .and_then(|u| u.host_str().map(str::to_string))
        .unwrap_or_default()
}

/// Aggregate results from multiple providers: optional dedup, then sort by
/// score descending.
#[must_use]
pub fn aggregate(results: Vec<SearchResult>, deduplicate: bool) -> Vec<SearchResult> {
    if results.is_empty() {
        return results;
    }

    let mut results = if deduplicate {
        dedupe(results)
    } else {
        results
    };

    results.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
    results
}

/// Remove duplicate results by content hash, keeping the higher-scoring
/// result (in place, so first-appearance order is otherwise preserved).
fn dedupe(results: Vec<SearchResult>) -> Vec<SearchResult> {
    let mut seen: HashMap<String, usize> = HashMap::new();
    let mut unique: Vec<SearchResult> = Vec::with_capacity(results.len());

    for result in results {
        let hash = content_hash(&result);
        if let Some(&idx) = seen.get(&hash) {
            if result.score > unique[idx].score {
                unique[idx] = result;
            }
        } else {
            seen.insert(hash, unique.len());
            unique.push(result);
        }
    }

    unique
}

/// Reciprocal Rank Fusion: `score[id] += 1.0 / (k + rank)` for 1-based
/// `rank` within each source list.
#[must_use]
pub fn reciprocal_rank_fusion(result_lists: Vec<Vec<SearchResult>>, k: u32) -> Vec<SearchResult> {
    let mut scores: IndexMap<String, f64> = IndexMap::new();
    let mut result_map: HashMap<String, SearchResult> = HashMap::new();

    for list in result_lists {
        for (i, result) in list.into_iter().enumerate() {
            let rank = i + 1;
            let hash = content_hash(&result);
            *scores.entry(hash.clone()).or_insert(0.0) += 1.0 / (f64::from(k) + rank as f64);
            result_map.entry(hash).or_insert(result);
        }
    }

    finalize(scores, result_map)
}

/// Weighted sum fusion: `score[id] += result.score` across lists, keeping
/// the highest-individual-score result as the representative.
#[must_use]
pub fn weighted_sum_fusion(result_lists: Vec<Vec<SearchResult>>) -> Vec<SearchResult> {
    let mut scores: IndexMap<String, f64> = IndexMap::new();
    let mut result_map: HashMap<String, SearchResult> = HashMap::new();

    for list in result_lists {
        for result in list {
            let hash = content_hash(&result);
            *scores.entry(hash.clone()).or_insert(0.0) += result.score;
            result_map
                .entry(hash)
                .and_modify(|existing| {
                    if result.score > existing.score {
                        *existing = result.clone();
                    }
                })
                .or_insert(result);
        }
    }

    finalize(scores, result_map)
}

/// Max score fusion: `score[id] = max(result.score)`.
#[must_use]
pub fn max_score_fusion(result_lists: Vec<Vec<SearchResult>>) -> Vec<SearchResult> {
    let mut best: IndexMap<String, f64> = IndexMap::new();
    let mut result_map: HashMap<String, SearchResult> = HashMap::new();

    for list in result_lists {
        for result in list {
            let hash = content_hash(&result);
            let is_better = best.get(&hash).map_or(true, |&b| result.score > b);
            if is_better {
                best.insert(hash.clone(), result.score);
                result_map.insert(hash, result);
            }
        }
    }

    finalize(best, result_map)
}

/// `scores` is an `IndexMap` so the subsequent stable sort breaks ties by
/// first-insertion order rather than by the randomized iteration order a
/// `HashMap` would give.
fn finalize(
    scores: IndexMap<String, f64>,
    result_map: HashMap<String, SearchResult>,
) -> Vec<SearchResult> {
    let mut entries: Vec<(String, f64)> = scores.into_iter().collect();
    entries.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));

    entries
        .into_iter()
        .filter_map(|(hash, score)| {
            result_map.get(&hash).cloned().map(|mut result| {
                result.score = score;
                result
            })
        })
        .collect()
}

/// Rerank by token-overlap relevance boost:
/// `boost = matching_query_terms / query_terms.len()`,
/// `score *= 1.0 + boost * 0.5`.
#[must_use]
pub fn rerank(mut results: Vec<SearchResult>, query: &str) -> Vec<SearchResult> {
    let query_terms: std::collections::HashSet<String> =
        query.to_lowercase().split_whitespace().map(str::to_string).collect();

    if query_terms.is_empty() {
        return results;
    }

    for result in &mut results {
        let content = format!(
            "{} {} {}",
            result.title.as_deref().unwrap_or(""),
            result.content.as_deref().unwrap_or(""),
            result.snippet.as_deref().unwrap_or("")
        )
        .to_lowercase();

        let matching = query_terms.iter().filter(|t| content.contains(t.as_str())).count();
        let boost = matching as f64 / query_terms.len() as f64;
        result.score *= 1.0 + boost * 0.5;
    }

    results.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
    results
}

/// Greedy diversification: always keep the top result, then admit each
/// subsequent result unless it's "similar" (same URL domain, or matching
/// first-50-chars-lowercased title) to an already-admitted result whose
/// similarity bucket has already been used `max_similar` times.
#[must_use]
pub fn diversify_results(results: Vec<SearchResult>, max_similar: usize) -> Vec<SearchResult> {
    if results.is_empty() {
        return results;
    }

    let mut iter = results.into_iter();
    let mut diversified = vec![iter.next().unwrap()];
    let mut similarity_counts: HashMap<String, usize> = HashMap::new();

    for result in iter {
        let mut too_similar = false;

        for selected in &diversified {
            if are_similar(&result, selected) {
                let bucket = domain(&result);
                let count = similarity_counts.entry(bucket).or_insert(0);
                *count += 1;
                if *count >= max_similar {
                    too_similar = true;
                }
                break;
            }
        }

        if !too_similar {
            diversified.push(result);
        }
    }

    diversified
}

fn are_similar(a: &SearchResult, b: &SearchResult) -> bool {
    if a.url.is_some() && b.url.is_some() {
        return domain(a) == domain(b);
    }
    match (&a.title, &b.title) {
        (Some(t1), Some(t2)) => {
            let prefix = |t: &str| t.to_lowercase().chars().take(50).collect::<String>();
            prefix(t1) == prefix(t2)
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(id: &str, url: Option<&str>, score: f64) -> SearchResult {
        SearchResult {
            id: id.to_string(),
            title: Some(format!("title {id}")),
            content: None,
            url: url.map(str::to_string),
            snippet: None,
            score,
            provider: "p".to_string(),
            metadata: None,
            highlights: None,
            explanation: None,
            vector: None,
        }
    }

    #[test]
    fn dedupe_keeps_higher_scoring_duplicate() {
        let results = vec![
            result("a", Some("https://x.example/1"), 0.5),
            result("b", Some("https://x.example/1"), 0.9),
        ];
        let aggregated = aggregate(results, true);
        assert_eq!(aggregated.len(), 1);
        assert_eq!(aggregated[0].id, "b");
    }

    #[test]
    fn reciprocal_rank_fusion_favors_consistently_ranked_results() {
        let a = vec![result("x", Some("https://a.example/1"), 1.0)];
        let b = vec![result("x", Some("https://a.example/1"), 1.0)];
        let fused = reciprocal_rank_fusion(vec![a, b], 60);
        assert_eq!(fused.len(), 1);
        assert!(fused[0].score > 0.0);
    }

    #[test]
    fn rerank_boosts_matching_terms() {
        let results = vec![
            result("a", None, 1.0),
            SearchResult {
                title: Some("rust async".to_string()),
                ..result("b", None, 1.0)
            },
        ];
        let reranked = rerank(results, "rust async");
        assert_eq!(reranked[0].id, "b");
    }

    #[test]
    fn diversify_limits_same_domain_results() {
        let results = vec![
            result("a", Some("https://x.example/1"), 1.0),
            result("b", Some("https://x.example/2"), 0.9),
            result("c", Some("https://x.example/3"), 0.8),
        ];
        let diversified = diversify_results(results, 1);
        assert_eq!(diversified.len(), 1);
    }
}
