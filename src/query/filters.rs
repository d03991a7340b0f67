//! Filter synthesis: turn extracted entities and classified intent into
//! search filters, the way a user's implicit constraints ("papers from
//! 2024 about Stanford research") become explicit ones.

use super::entities::{Entity, EntityKind};
use super::intent::{Intent, IntentKind};
use crate::models::JsonMap;
use serde_json::Value;

/// Synthesize filters from `entities`/`intent`. Returns `None` if neither
/// contributes anything, matching the original's `filters or None`.
#[must_use]
pub fn generate(entities: &[Entity], intent: &Intent) -> Option<JsonMap> {
    let mut filters = JsonMap::new();

    for entity in entities {
        match entity.kind {
            EntityKind::Date => {
                filters.insert("date_range".to_string(), Value::String(entity.value.clone()));
            }
            EntityKind::Location => {
                filters.insert("location".to_string(), Value::String(entity.value.clone()));
            }
            EntityKind::Organization => {
                filters.insert(
                    "organization".to_string(),
                    Value::String(entity.value.clone()),
                );
            }
            _ => {}
        }
    }

    match intent.kind {
        IntentKind::Academic => {
            filters.insert(
                "document_type".to_string(),
                Value::Array(vec![
                    Value::String("paper".to_string()),
                    Value::String("article".to_string()),
                    Value::String("thesis".to_string()),
                ]),
            );
        }
        IntentKind::News => {
            filters.insert(
                "document_type".to_string(),
                Value::Array(vec![
                    Value::String("news".to_string()),
                    Value::String("blog".to_string()),
                ]),
            );
        }
        _ => {}
    }

    if filters.is_empty() {
        None
    } else {
        Some(filters)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_entities_or_notable_intent_yields_none() {
        let intent = Intent {
            kind: IntentKind::General,
            confidence: 0.6,
        };
        assert!(generate(&[], &intent).is_none());
    }

    #[test]
    fn academic_intent_adds_document_type() {
        let intent = Intent {
            kind: IntentKind::Academic,
            confidence: 0.8,
        };
        let filters = generate(&[], &intent).unwrap();
        assert!(filters.contains_key("document_type"));
    }
}
