//! Intent classification: a fixed keyword-triggered decision list, checked
//! in priority order, falling back to a low-confidence `General` intent.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum IntentKind {
    Explanation,
    Comparison,
    News,
    Academic,
    Tutorial,
    General,
}

#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct Intent {
    pub kind: IntentKind,
    pub confidence: f64,
}

const RULES: &[(IntentKind, &[&str], f64)] = &[
    (
        IntentKind::Explanation,
        &["explain", "what is", "how does", "define"],
        0.85,
    ),
    (
        IntentKind::Comparison,
        &["compare", "difference", "versus", "vs"],
        0.80,
    ),
    (IntentKind::News, &["latest", "recent", "new", "news"], 0.75),
    (
        IntentKind::Academic,
        &["paper", "research", "study", "academic"],
        0.80,
    ),
    (
        IntentKind::Tutorial,
        &["tutorial", "guide", "how to", "example"],
        0.85,
    ),
];

/// Classify the intent of `query` using the first matching keyword rule.
#[must_use]
pub fn classify(query: &str) -> Intent {
    let lower = query.to_lowercase();
    for (kind, triggers, confidence) in RULES {
        if triggers.iter().any(|t| lower.contains(t)) {
            return Intent {
                kind: *kind,
                confidence: *confidence,
            };
        }
    }
    Intent {
        kind: IntentKind::General,
        confidence: 0.60,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_academic_intent() {
        assert_eq!(classify("recent research papers on transformers").kind, IntentKind::News);
    }

    #[test]
    fn falls_back_to_general() {
        assert_eq!(classify("hello there").kind, IntentKind::General);
    }
}
