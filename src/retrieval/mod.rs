//! Hybrid retrieval and result fusion
//!
//! Combines three strategies over a loaded corpus - structured-entity lookup,
//! tree reasoning through an external call, and the legacy keyword/chunk
//! scorer - then merges, deduplicates, and ranks their candidates.

pub mod dedup;
pub mod engine;
pub mod lexical;
pub mod scorer;

pub use dedup::deduplicate_chunks;
pub use engine::{EngineStatus, HybridRetriever};
pub use lexical::lexical_search;
pub use scorer::{score_chunk, ScoreWeights};

use serde::Serialize;
use std::collections::BTreeMap;

/// A single piece of retrieved knowledge with its provenance and score.
#[derive(Debug, Clone, Serialize)]
pub struct KnowledgeChunk {
    /// The actual text content
    pub content: String,
    /// Where this came from (document/section description)
    pub source: String,
    /// Additional info: document id, producing strategy, chunk/node/entity id
    pub metadata: BTreeMap<String, String>,
    /// Relevance score in [0, 1]
    pub score: f32,
}

/// Result from knowledge retrieval, highest score first.
#[derive(Debug, Clone, Serialize)]
pub struct RetrievalResult {
    pub chunks: Vec<KnowledgeChunk>,
    /// Original query
    pub query: String,
    /// Candidates accepted before truncation to top-k
    pub total_found: usize,
}

impl RetrievalResult {
    pub fn empty(query: impl Into<String>) -> Self {
        Self {
            chunks: Vec::new(),
            query: query.into(),
            total_found: 0,
        }
    }

    /// Get the highest scoring chunk
    pub fn best_chunk(&self) -> Option<&KnowledgeChunk> {
        self.chunks
            .iter()
            .max_by(|a, b| a.score.partial_cmp(&b.score).unwrap_or(std::cmp::Ordering::Equal))
    }

    /// Combine the top chunks into a single context string
    pub fn combined_content(&self, max_chunks: usize) -> String {
        let mut sorted: Vec<&KnowledgeChunk> = self.chunks.iter().collect();
        sorted.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        sorted
            .iter()
            .take(max_chunks)
            .map(|c| c.content.as_str())
            .collect::<Vec<_>>()
            .join("\n\n---\n\n")
    }
}

/// Optional retrieval filters
#[derive(Debug, Clone, Default)]
pub struct QueryFilters {
    /// Restrict all strategies to one document
    pub document_id: Option<String>,
}

/// Render a retrieval result as numbered reference blocks for the
/// answer-synthesis handoff.
pub fn format_context(result: &RetrievalResult) -> String {
    if result.chunks.is_empty() {
        return "No relevant information found in the policy corpus.".to_string();
    }

    let mut out = format!("### Reference information ({} sources):\n\n", result.chunks.len());
    for (i, chunk) in result.chunks.iter().enumerate() {
        out.push_str(&format!(
            "**[{}] {}**\n{}\n\n---\n\n",
            i + 1,
            chunk.source,
            chunk.content
        ));
    }
    out
}
