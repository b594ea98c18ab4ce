//! External reasoning boundary for tree-node selection
//!
//! The tree strategy sends a compact document forest plus the user query to an
//! external reasoning capability, which answers with up to three node
//! references. The boundary is a narrow async trait so tests can inject a
//! deterministic fake; responses are tolerated in fenced or malformed form,
//! with any parse failure treated as an empty contribution by the caller.

mod gemini;

pub use gemini::GeminiSelector;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;

/// Relevance grade returned by the reasoning call. Anything unrecognized
/// degrades to medium.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Relevance {
    High,
    #[serde(other)]
    Medium,
}

impl Default for Relevance {
    fn default() -> Self {
        Self::Medium
    }
}

impl Relevance {
    /// Fixed score assigned to chunks produced by the tree strategy
    pub fn score(self) -> f32 {
        match self {
            Self::High => 0.95,
            Self::Medium => 0.80,
        }
    }
}

/// One selected tree node
#[derive(Debug, Clone, Deserialize)]
pub struct NodeSelection {
    #[serde(default)]
    pub doc_id: String,
    #[serde(default)]
    pub node_id: String,
    #[serde(default)]
    pub relevance: Relevance,
}

/// The external reasoning capability: given the compact forest (as JSON text)
/// and the query, pick the most relevant nodes.
#[async_trait]
pub trait NodeSelector: Send + Sync {
    async fn select_nodes(&self, compact_forest: &str, query: &str) -> Result<Vec<NodeSelection>>;
}

/// Parse a raw reasoning response into node selections.
///
/// Strips markdown code fencing before parsing; callers treat any error as
/// "no tree-strategy contribution".
pub fn parse_selection_response(raw: &str) -> Result<Vec<NodeSelection>> {
    let text = strip_code_fences(raw.trim());
    serde_json::from_str(text).context("Reasoning response is not a valid selection array")
}

fn strip_code_fences(text: &str) -> &str {
    let mut text = text;
    if let Some(rest) = text.strip_prefix("```") {
        // Drop the opening fence line (which may carry a language tag)
        text = match rest.find('\n') {
            Some(idx) => &rest[idx + 1..],
            None => rest,
        };
        if let Some(idx) = text.rfind("```") {
            text = &text[..idx];
        }
    }
    text.trim()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_plain_array() {
        let raw = r#"[{"doc_id": "noi_quy", "node_id": "0001", "relevance": "high"}]"#;
        let selections = parse_selection_response(raw).unwrap();
        assert_eq!(selections.len(), 1);
        assert_eq!(selections[0].doc_id, "noi_quy");
        assert_eq!(selections[0].relevance, Relevance::High);
    }

    #[test]
    fn test_parse_fenced_array() {
        let raw = "```json\n[{\"doc_id\": \"a\", \"node_id\": \"0002\", \"relevance\": \"medium\"}]\n```";
        let selections = parse_selection_response(raw).unwrap();
        assert_eq!(selections.len(), 1);
        assert_eq!(selections[0].node_id, "0002");
        assert_eq!(selections[0].relevance, Relevance::Medium);
    }

    #[test]
    fn test_parse_empty_array() {
        assert!(parse_selection_response("[]").unwrap().is_empty());
        assert!(parse_selection_response("```\n[]\n```").unwrap().is_empty());
    }

    #[test]
    fn test_parse_garbage_fails() {
        assert!(parse_selection_response("sorry, I cannot help").is_err());
        assert!(parse_selection_response("").is_err());
    }

    #[test]
    fn test_unknown_relevance_degrades_to_medium() {
        let raw = r#"[{"doc_id": "a", "node_id": "1", "relevance": "very-high"}]"#;
        let selections = parse_selection_response(raw).unwrap();
        assert_eq!(selections[0].relevance, Relevance::Medium);
    }

    #[test]
    fn test_missing_relevance_defaults_to_medium() {
        let raw = r#"[{"doc_id": "a", "node_id": "1"}]"#;
        let selections = parse_selection_response(raw).unwrap();
        assert_eq!(selections[0].relevance, Relevance::Medium);
    }

    #[test]
    fn test_relevance_scores() {
        assert_eq!(Relevance::High.score(), 0.95);
        assert_eq!(Relevance::Medium.score(), 0.80);
    }
}
