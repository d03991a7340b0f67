//! Query expansion: append the first synonym for each matched term in a
//! small table, plus one related term per `Technology` entity.

use super::entities::{Entity, EntityKind};

const SYNONYMS: &[(&str, &[&str])] = &[
    (
        "machine learning",
        &["ML", "artificial intelligence", "AI", "deep learning"],
    ),
    (
        "transformer",
        &["attention mechanism", "self-attention", "bert", "gpt"],
    ),
    ("search", &["retrieval", "query", "find", "lookup"]),
    ("database", &["datastore", "repository", "storage", "db"]),
];

fn synonyms_for(term: &str) -> Option<&'static [&'static str]> {
    SYNONYMS
        .iter()
        .find(|(key, _)| *key == term)
        .map(|(_, syns)| *syns)
}

/// Expand `query` with the first synonym of any matched term, plus one
/// related term per technology entity already extracted.
#[must_use]
pub fn expand(query: &str, entities: &[Entity]) -> String {
    let lower = query.to_lowercase();
    let mut terms = vec![query.to_string()];

    for (term, syns) in SYNONYMS {
        if lower.contains(term) {
            if let Some(first) = syns.first() {
                terms.push((*first).to_string());
            }
        }
    }

    for entity in entities {
        if entity.kind == EntityKind::Technology {
            if let Some(related) = synonyms_for(&entity.value.to_lowercase()) {
                if let Some(first) = related.first() {
                    terms.push((*first).to_string());
                }
            }
        }
    }

    terms.join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expands_matched_synonym() {
        let expanded = expand("search for papers", &[]);
        assert!(expanded.contains("retrieval"));
    }

    #[test]
    fn leaves_unrelated_query_mostly_unchanged() {
        let expanded = expand("hello world", &[]);
        assert_eq!(expanded, "hello world");
    }
}
