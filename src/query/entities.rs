//! Named-entity extraction over raw query text.
//!
//! Pattern-based entities (dates, emails, URLs, ...) run first, then
//! keyword-list entities (technology terms, organizations, ...), then
//! numeric entities. Everything is collected with its `(start, end)` byte
//! span and then passed through an overlap-removal sweep so a query like
//! "2024-01-15" isn't reported as both a DATE and a NUMBER.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EntityKind {
    Date,
    Email,
    Url,
    Phone,
    Money,
    Percentage,
    Time,
    Technology,
    Organization,
    Person,
    Location,
    ResearchField,
    Quantity,
    Number,
    Ordinal,
    Cardinal,
}

#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct Entity {
    pub text: String,
    pub kind: EntityKind,
    pub value: String,
    pub confidence: f64,
    #[serde(skip)]
    pub start: usize,
    #[serde(skip)]
    pub end: usize,
}

struct PatternEntity {
    kind: EntityKind,
    regex: Regex,
}

static PATTERNS: Lazy<Vec<PatternEntity>> = Lazy::new(|| {
    vec![
        PatternEntity {
            kind: EntityKind::Date,
            regex: Regex::new(r"(?i)\b(\d{4}-\d{2}-\d{2}|\d{1,2}[/-]\d{1,2}[/-]\d{2,4})\b").unwrap(),
        },
        PatternEntity {
            kind: EntityKind::Email,
            regex: Regex::new(r"(?i)\b[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}\b").unwrap(),
        },
        PatternEntity {
            kind: EntityKind::Url,
            regex: Regex::new(r"(?i)https?://[^\s<>]+|www\.[^\s<>]+").unwrap(),
        },
        PatternEntity {
            kind: EntityKind::Phone,
            regex: Regex::new(r"\b\d{3}-\d{3}-\d{4}\b").unwrap(),
        },
        PatternEntity {
            kind: EntityKind::Money,
            regex: Regex::new(r"\$\d+(?:,\d{3})*(?:\.\d{2})?").unwrap(),
        },
        PatternEntity {
            kind: EntityKind::Percentage,
            regex: Regex::new(r"(?i)\b\d+(?:\.\d+)?\s?(?:%|percent)\b").unwrap(),
        },
        PatternEntity {
            kind: EntityKind::Time,
            regex: Regex::new(r"(?i)\b\d{1,2}:\d{2}(?::\d{2})?\s?(?:am|pm)?\b").unwrap(),
        },
    ]
});

const TECHNOLOGY: &[&str] = &[
    "transformer",
    "transformers",
    "bert",
    "gpt",
    "attention",
    "self-attention",
    "neural network",
    "machine learning",
    "deep learning",
    "artificial intelligence",
    "natural language processing",
    "nlp",
    "computer vision",
    "reinforcement learning",
];

const ORGANIZATION: &[&str] = &[
    "google", "microsoft", "openai", "huggingface", "deepmind", "nvidia", "mit", "stanford",
    "ieee", "acm", "arxiv",
];

const PERSON: &[&str] = &["smith", "johnson", "brown", "davis", "miller", "wilson"];

const LOCATION: &[&str] = &[
    "new york",
    "san francisco",
    "california",
    "usa",
    "united states",
    "canada",
    "uk",
    "germany",
    "china",
    "india",
];

const RESEARCH_FIELD: &[&str] = &[
    "computer science",
    "data science",
    "statistics",
    "mathematics",
    "physics",
    "biology",
    "neuroscience",
    "linguistics",
];

const ORDINALS: &[&str] = &[
    "first", "second", "third", "fourth", "fifth", "sixth", "seventh", "eighth", "ninth", "tenth",
];

const CARDINALS: &[&str] = &[
    "one", "two", "three", "four", "five", "six", "seven", "eight", "nine", "ten", "eleven",
    "twelve",
];

static QUANTITY_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b\d+(?:,\d{3})*(?:\.\d+)?\s?(?:billion|million|thousand|hundred)\b").unwrap()
});
static NUMBER_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b\d+(?:,\d{3})*(?:\.\d+)?\b").unwrap());

fn push_keyword_matches(text: &str, keywords: &[&str], kind: EntityKind, out: &mut Vec<Entity>) {
    let lower = text.to_lowercase();
    for keyword in keywords {
        let mut search_start = 0;
        while let Some(rel) = lower[search_start..].find(keyword) {
            let start = search_start + rel;
            let end = start + keyword.len();
            let on_word_boundary = (start == 0
                || !lower.as_bytes()[start - 1].is_ascii_alphanumeric())
                && (end == lower.len() || !lower.as_bytes()[end].is_ascii_alphanumeric());
            if on_word_boundary {
                out.push(Entity {
                    text: text[start..end].to_string(),
                    kind,
                    value: (*keyword).to_string(),
                    confidence: 0.9,
                    start,
                    end,
                });
            }
            search_start = end.max(search_start + 1);
        }
    }
}

/// Extract all recognized entities from `text`, overlap-resolved and
/// ordered by position.
#[must_use]
pub fn extract(text: &str) -> Vec<Entity> {
    let mut entities = Vec::new();

    for pattern in PATTERNS.iter() {
        for m in pattern.regex.find_iter(text) {
            entities.push(Entity {
                text: m.as_str().to_string(),
                kind: pattern.kind,
                value: m.as_str().to_string(),
                confidence: 0.95,
                start: m.start(),
                end: m.end(),
            });
        }
    }

    push_keyword_matches(text, TECHNOLOGY, EntityKind::Technology, &mut entities);
    push_keyword_matches(text, ORGANIZATION, EntityKind::Organization, &mut entities);
    push_keyword_matches(text, PERSON, EntityKind::Person, &mut entities);
    push_keyword_matches(text, LOCATION, EntityKind::Location, &mut entities);
    push_keyword_matches(
        text,
        RESEARCH_FIELD,
        EntityKind::ResearchField,
        &mut entities,
    );

    for m in QUANTITY_RE.find_iter(text) {
        entities.push(Entity {
            text: m.as_str().to_string(),
            kind: EntityKind::Quantity,
            value: m.as_str().to_string(),
            confidence: 0.85,
            start: m.start(),
            end: m.end(),
        });
    }
    for m in NUMBER_RE.find_iter(text) {
        entities.push(Entity {
            text: m.as_str().to_string(),
            kind: EntityKind::Number,
            value: m.as_str().to_string(),
            confidence: 0.85,
            start: m.start(),
            end: m.end(),
        });
    }
    push_keyword_matches(text, ORDINALS, EntityKind::Ordinal, &mut entities);
    push_keyword_matches(text, CARDINALS, EntityKind::Cardinal, &mut entities);

    remove_overlaps(entities)
}

/// Keep the highest-confidence entity in each overlapping span, matching
/// the original's sort-by-`(start, -confidence)` greedy sweep.
fn remove_overlaps(mut entities: Vec<Entity>) -> Vec<Entity> {
    entities.sort_by(|a, b| {
        a.start
            .cmp(&b.start)
            .then(b.confidence.partial_cmp(&a.confidence).unwrap())
    });

    let mut filtered: Vec<Entity> = Vec::new();
    for entity in entities {
        let mut displaced = None;
        let mut blocked = false;
        for (i, accepted) in filtered.iter().enumerate() {
            let overlaps = entity.start < accepted.end && entity.end > accepted.start;
            if overlaps {
                if entity.confidence <= accepted.confidence {
                    blocked = true;
                } else {
                    displaced = Some(i);
                }
                break;
            }
        }
        if blocked {
            continue;
        }
        if let Some(i) = displaced {
            filtered.remove(i);
        }
        filtered.push(entity);
    }

    filtered.sort_by_key(|e| e.start);
    filtered
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_date_and_technology() {
        let entities = extract("the transformer paper was published on 2024-01-15");
        assert!(entities.iter().any(|e| e.kind == EntityKind::Date));
        assert!(entities.iter().any(|e| e.kind == EntityKind::Technology));
    }

    #[test]
    fn overlapping_number_and_quantity_keeps_quantity() {
        let entities = extract("about 5 million users");
        let spans: Vec<_> = entities
            .iter()
            .filter(|e| e.start < 25 && e.end > 5)
            .collect();
        assert!(spans.iter().any(|e| e.kind == EntityKind::Quantity));
        assert!(!spans.iter().any(|e| e.kind == EntityKind::Number));
    }

    #[test]
    fn extracts_email() {
        let entities = extract("contact me at jane.doe@example.com please");
        assert!(entities.iter().any(|e| e.kind == EntityKind::Email));
    }
}
