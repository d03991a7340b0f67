//! Keyword extraction: lowercase, split on whitespace, drop stopwords,
//! keep anything longer than two characters.

const STOPWORDS: &[&str] = &[
    "the", "a", "an", "and", "or", "but", "in", "on", "at", "to", "for", "of", "with", "by",
    "from", "is", "are", "was", "were", "been", "be",
];

#[must_use]
pub fn extract(query: &str) -> Vec<String> {
    query
        .to_lowercase()
        .split_whitespace()
        .filter(|w| !STOPWORDS.contains(w) && w.len() > 2)
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drops_stopwords_and_short_words() {
        let keywords = extract("the attention is all you need for a transformer");
        assert_eq!(keywords, vec!["attention", "all", "you", "need", "transformer"]);
    }
}
