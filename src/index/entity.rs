//! Structured-entity index
//!
//! Holds rule records extracted offline from the policy documents and scores
//! them against queries with pure text/attribute matching. No external calls;
//! lookups are synchronous and in-memory.

use crate::retrieval::KnowledgeChunk;
use serde::Deserialize;
use std::collections::{BTreeMap, HashSet};
use std::path::Path;

/// Query/entity-text word overlap scales into [0, TEXT_OVERLAP_WEIGHT]
const TEXT_OVERLAP_WEIGHT: f32 = 0.3;
/// Each attribute key or value containing a query token contributes this much
const ATTR_MATCH_WEIGHT: f32 = 0.15;
/// Summed attribute contributions are capped here
const ATTR_MATCH_CAP: f32 = 0.4;
/// Bonus when a synonym phrase in the query matches the entity rule type
const SYNONYM_BONUS: f32 = 0.3;

/// Attribute keys rendered first, in this order, when an entity is formatted
/// as context.
const IMPORTANT_KEYS: [&str; 10] = [
    "rule_type",
    "condition",
    "duration",
    "amount",
    "calculation_method",
    "mechanism",
    "pay_status",
    "legal_reference",
    "restriction",
    "example",
];

/// Query phrases mapped to the rule-type tags they imply. A query containing
/// the phrase earns a bonus for entities whose rule_type carries one of the
/// tags.
const SYNONYM_BONUSES: [(&str, &[&str]); 9] = [
    (
        "phép",
        &[
            "leave",
            "annual_leave",
            "prorated_leave",
            "leave_accrual",
            "leave_credit",
            "leave_advance",
        ],
    ),
    ("thử việc", &["probation"]),
    ("chính thức", &["probation"]),
    ("thai sản", &["maternity", "paternity"]),
    ("kết hôn", &["special_leave", "wedding"]),
    ("giờ làm", &["working_hours", "working_days"]),
    ("đi muộn", &["lateness", "late_threshold"]),
    ("kỷ luật", &["disciplinary", "termination"]),
    ("vay", &["loan", "financial"]),
];

/// A pre-extracted structured fact: rule category, verbatim source text, and
/// free-form attributes.
#[derive(Debug, Clone, Deserialize)]
pub struct Entity {
    #[serde(default)]
    pub class: String,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub attributes: BTreeMap<String, serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct DocumentEntities {
    #[serde(default)]
    entities: Vec<Entity>,
}

/// Read-only store of structured entities grouped by document id.
#[derive(Debug, Default)]
pub struct EntityIndex {
    entities: BTreeMap<String, Vec<Entity>>,
}

impl EntityIndex {
    /// Load the offline-produced entities file. A missing or malformed file
    /// yields an empty index; the keyword/chunk path must stay usable without
    /// enhancement data.
    pub fn load(entities_file: &Path) -> Self {
        if !entities_file.exists() {
            return Self::default();
        }

        let content = match std::fs::read_to_string(entities_file) {
            Ok(content) => content,
            Err(e) => {
                tracing::warn!("Failed to read entities file {:?}: {}", entities_file, e);
                return Self::default();
            }
        };

        let parsed: BTreeMap<String, DocumentEntities> = match serde_json::from_str(&content) {
            Ok(parsed) => parsed,
            Err(e) => {
                tracing::warn!("Failed to parse entities file {:?}: {}", entities_file, e);
                return Self::default();
            }
        };

        let entities: BTreeMap<String, Vec<Entity>> = parsed
            .into_iter()
            .filter(|(_, doc)| !doc.entities.is_empty())
            .map(|(doc_id, doc)| (doc_id, doc.entities))
            .collect();

        Self { entities }
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn entity_count(&self) -> usize {
        self.entities.values().map(Vec::len).sum()
    }

    /// Score every entity against the query and return those above the
    /// inclusion threshold, formatted as knowledge chunks.
    pub fn lookup(
        &self,
        query: &str,
        document_filter: Option<&str>,
        score_threshold: f32,
    ) -> Vec<KnowledgeChunk> {
        let query_lower = query.to_lowercase();
        let query_words: HashSet<&str> = query_lower.split_whitespace().collect();
        let mut chunks = Vec::new();

        for (doc_id, entities) in &self.entities {
            if let Some(filter_id) = document_filter {
                if filter_id != doc_id {
                    continue;
                }
            }

            for entity in entities {
                let score = score_entity(&query_lower, &query_words, entity);
                if score <= score_threshold {
                    continue;
                }

                let class = if entity.class.is_empty() {
                    "Rule"
                } else {
                    entity.class.as_str()
                };

                let mut metadata = BTreeMap::new();
                metadata.insert("doc_id".to_string(), doc_id.clone());
                metadata.insert("entity_class".to_string(), entity.class.clone());
                metadata.insert(
                    "rule_type".to_string(),
                    entity
                        .attributes
                        .get("rule_type")
                        .map(value_to_string)
                        .unwrap_or_default(),
                );
                metadata.insert("strategy".to_string(), "entity_lookup".to_string());

                chunks.push(KnowledgeChunk {
                    content: format_entity_as_context(entity),
                    source: format!("Policy (structured) - {}", class),
                    metadata,
                    score,
                });
            }
        }

        chunks
    }
}

/// Score the relevance of one entity to the query.
fn score_entity(query: &str, query_words: &HashSet<&str>, entity: &Entity) -> f32 {
    let mut score = 0.0f32;

    // Word overlap with the verbatim source text
    let entity_text = entity.text.to_lowercase();
    let entity_words: HashSet<&str> = entity_text.split_whitespace().collect();
    let text_overlap = query_words.intersection(&entity_words).count();
    if text_overlap > 0 {
        let ratio = text_overlap as f32 / query_words.len().max(1) as f32;
        score += ratio.min(1.0) * TEXT_OVERLAP_WEIGHT;
    }

    // Attribute keys and values literally containing any query token
    let mut attr_match_count = 0usize;
    for (key, value) in &entity.attributes {
        let value_lower = value_to_string(value).to_lowercase();
        if query_words.iter().any(|w| value_lower.contains(w)) {
            attr_match_count += 1;
        }
        let key_lower = key.to_lowercase();
        if query_words.iter().any(|w| key_lower.contains(w)) {
            attr_match_count += 1;
        }
    }
    if attr_match_count > 0 {
        score += (attr_match_count as f32 * ATTR_MATCH_WEIGHT).min(ATTR_MATCH_CAP);
    }

    // Domain synonym bonus on the rule_type tag
    let rule_type = entity
        .attributes
        .get("rule_type")
        .map(value_to_string)
        .unwrap_or_default()
        .to_lowercase();
    for (phrase, rule_types) in SYNONYM_BONUSES {
        if query.contains(phrase) && rule_types.iter().any(|rt| rule_type.contains(rt)) {
            score += SYNONYM_BONUS;
        }
    }

    score.min(1.0)
}

/// Render a structured entity as readable context: class, verbatim text, then
/// the important attributes in their fixed order, then everything else.
fn format_entity_as_context(entity: &Entity) -> String {
    let class = if entity.class.is_empty() {
        "Rule"
    } else {
        entity.class.as_str()
    };
    let mut lines = vec![format!("**[{}]** {}", class, entity.text)];

    for key in IMPORTANT_KEYS {
        if let Some(value) = entity.attributes.get(key) {
            lines.push(format!("  - {}: {}", key, value_to_string(value)));
        }
    }

    for (key, value) in &entity.attributes {
        if !IMPORTANT_KEYS.contains(&key.as_str()) {
            lines.push(format!("  - {}: {}", key, value_to_string(value)));
        }
    }

    lines.join("\n")
}

fn value_to_string(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn sample_entities() -> serde_json::Value {
        serde_json::json!({
            "noi_quy": {
                "entities": [
                    {
                        "class": "LeaveRule",
                        "text": "12 ngày phép mỗi năm, hưởng nguyên lương",
                        "attributes": {
                            "rule_type": "annual_leave_entitlement",
                            "condition": "làm việc đủ 12 tháng",
                            "duration": "12 ngày",
                            "note": "áp dụng toàn công ty"
                        }
                    },
                    {
                        "class": "WorkingRule",
                        "text": "giờ làm việc từ 8h00 đến 17h30",
                        "attributes": {
                            "rule_type": "working_hours",
                            "duration": "8 tiếng"
                        }
                    }
                ]
            }
        })
    }

    fn load_index() -> EntityIndex {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("entities.json");
        fs::write(&path, sample_entities().to_string()).unwrap();
        EntityIndex::load(&path)
    }

    #[test]
    fn test_load() {
        let index = load_index();
        assert!(!index.is_empty());
        assert_eq!(index.entity_count(), 2);
    }

    #[test]
    fn test_missing_file_yields_empty_index() {
        let index = EntityIndex::load(Path::new("/nonexistent/entities.json"));
        assert!(index.is_empty());
        assert_eq!(index.entity_count(), 0);
    }

    #[test]
    fn test_malformed_file_yields_empty_index() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("entities.json");
        fs::write(&path, "not json at all {{{").unwrap();
        let index = EntityIndex::load(&path);
        assert!(index.is_empty());
    }

    #[test]
    fn test_lookup_matches_leave_query() {
        let index = load_index();
        let chunks = index.lookup("nghỉ phép được bao nhiêu ngày phép", None, 0.3);
        assert!(!chunks.is_empty());
        let best = &chunks[0];
        assert!(best.content.contains("**[LeaveRule]**"));
        assert_eq!(best.metadata.get("strategy").unwrap(), "entity_lookup");
    }

    #[test]
    fn test_lookup_scores_bounded() {
        let index = load_index();
        for chunk in index.lookup("phép thử việc giờ làm đi muộn", None, 0.0) {
            assert!((0.0..=1.0).contains(&chunk.score));
        }
    }

    #[test]
    fn test_synonym_bonus_promotes_rule_type() {
        let index = load_index();
        // "phép" maps to leave-flavored rule types; the leave entity should
        // clear the threshold on the bonus plus overlap
        let chunks = index.lookup("còn bao nhiêu ngày phép", None, 0.3);
        assert!(chunks
            .iter()
            .any(|c| c.metadata.get("rule_type").unwrap() == "annual_leave_entitlement"));
    }

    #[test]
    fn test_document_filter() {
        let index = load_index();
        let chunks = index.lookup("ngày phép", Some("other_doc"), 0.0);
        assert!(chunks.is_empty());
    }

    #[test]
    fn test_threshold_drops_weak_matches() {
        let index = load_index();
        let all = index.lookup("ngày phép", None, 0.0);
        let filtered = index.lookup("ngày phép", None, 0.9);
        assert!(all.len() >= filtered.len());
    }

    #[test]
    fn test_format_orders_important_keys_first() {
        let index = load_index();
        let chunks = index.lookup("nghỉ phép 12 ngày nguyên lương", None, 0.0);
        let content = &chunks
            .iter()
            .find(|c| c.content.contains("LeaveRule"))
            .unwrap()
            .content;

        let rule_type_pos = content.find("rule_type").unwrap();
        let condition_pos = content.find("condition").unwrap();
        let note_pos = content.find("note").unwrap();
        assert!(rule_type_pos < condition_pos);
        assert!(condition_pos < note_pos);
    }
}
