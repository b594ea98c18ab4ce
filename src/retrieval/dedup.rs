//! Near-duplicate removal for fused candidate lists
//!
//! Two chunks count as near-duplicates when their content word sets overlap
//! by more than the configured ratio; the higher-scored one survives.

use crate::retrieval::KnowledgeChunk;
use std::collections::HashSet;

/// Remove near-duplicate chunks by content word overlap.
///
/// Candidates are visited in score order; each is kept only if its overlap
/// ratio `|intersection| / max(|a|, |b|)` with every already-accepted chunk
/// stays at or below `overlap_threshold`. Running this twice on an already
/// deduplicated list returns the same list.
pub fn deduplicate_chunks(
    mut chunks: Vec<KnowledgeChunk>,
    overlap_threshold: f32,
) -> Vec<KnowledgeChunk> {
    if chunks.len() <= 1 {
        return chunks;
    }

    // Sort by score descending so higher-scored chunks win
    chunks.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));

    let mut accepted: Vec<KnowledgeChunk> = Vec::new();
    let mut accepted_words: Vec<HashSet<String>> = Vec::new();

    for chunk in chunks {
        let words: HashSet<String> = chunk
            .content
            .to_lowercase()
            .split_whitespace()
            .map(str::to_string)
            .collect();

        let is_duplicate = accepted_words.iter().any(|existing| {
            if words.is_empty() || existing.is_empty() {
                return false;
            }
            let overlap = words.intersection(existing).count();
            let max_len = words.len().max(existing.len());
            overlap as f32 / max_len as f32 > overlap_threshold
        });

        if !is_duplicate {
            accepted_words.push(words);
            accepted.push(chunk);
        }
    }

    accepted
}
