//! Cache key generation, matching the original gateway's scheme:
//! `uir:v1:{sorted_providers}:{hash(query|text|vector-prefix)}:{hash(options)[..8]}`,
//! or `uir:custom:{key}` when the caller supplied an explicit key.

use crate::models::SearchOptions;
use sha2::{Digest, Sha256};

fn hash(input: &str) -> String {
    Sha256::digest(input.as_bytes())
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect()
}

/// What the request is keyed on: a keyword query, embeddable text, a raw
/// vector (only its first 10 dimensions are hashed, matching the
/// original), or an opaque composite string (a hybrid request's
/// serialized strategy list, which has no single query/vector of its
/// own to key on).
pub enum KeyInput<'a> {
    Query(&'a str),
    Text(&'a str),
    Vector(&'a [f32]),
    Composite(&'a str),
}

/// Build a cache key for a request. `providers` need not be pre-sorted.
#[must_use]
pub fn build(
    providers: &[String],
    input: KeyInput<'_>,
    options: Option<&SearchOptions>,
    custom_key: Option<&str>,
) -> String {
    if let Some(custom) = custom_key {
        return format!("uir:custom:{custom}");
    }

    let mut sorted_providers = providers.to_vec();
    sorted_providers.sort();

    let input_hash = match input {
        KeyInput::Query(q) => hash(q),
        KeyInput::Text(t) => hash(t),
        KeyInput::Vector(v) => {
            let prefix: Vec<String> = v.iter().take(10).map(ToString::to_string).collect();
            hash(&prefix.join(","))
        }
        KeyInput::Composite(c) => hash(c),
    };

    let mut parts = vec![sorted_providers.join(","), input_hash];

    if let Some(options) = options {
        if let Ok(json) = serde_json::to_string(options) {
            parts.push(hash(&json)[..8].to_string());
        }
    }

    format!("uir:v1:{}", parts.join(":"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn custom_key_takes_priority() {
        let key = build(&["a".into()], KeyInput::Query("x"), None, Some("mine"));
        assert_eq!(key, "uir:custom:mine");
    }

    #[test]
    fn providers_are_sorted_for_stable_keys() {
        let k1 = build(&["b".into(), "a".into()], KeyInput::Query("x"), None, None);
        let k2 = build(&["a".into(), "b".into()], KeyInput::Query("x"), None, None);
        assert_eq!(k1, k2);
    }

    #[test]
    fn same_query_and_options_yield_same_key() {
        let opts = SearchOptions::default();
        let k1 = build(&["a".into()], KeyInput::Query("hello"), Some(&opts), None);
        let k2 = build(&["a".into()], KeyInput::Query("hello"), Some(&opts), None);
        assert_eq!(k1, k2);
    }
}
