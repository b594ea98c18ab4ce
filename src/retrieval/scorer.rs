//! Multi-signal chunk relevance scoring
//!
//! Additive weighted score over curated-mapping, keyword, and n-gram overlap
//! signals, clamped to [0, 1]. A curated target-section match dominates: a
//! hand-authored mapping is the most precise signal available, so it must beat
//! generic word overlap.

use crate::corpus::Chunk;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Scoring weights. Hand-tuned in the source system; overridable via
/// configuration but never re-derived.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoreWeights {
    /// Chunk sits in the exact section a curated query mapping points at
    #[serde(default = "default_target_section")]
    pub target_section: f32,
    /// Document matched via a curated query mapping
    #[serde(default = "default_mapped_document")]
    pub mapped_document: f32,
    /// Document matched via its keyword list
    #[serde(default = "default_keyword_match")]
    pub keyword_match: f32,
    /// Proportion of query bigrams present in the chunk title
    #[serde(default = "default_title_bigram")]
    pub title_bigram: f32,
    /// Proportion of query words present in the chunk title
    #[serde(default = "default_title_word")]
    pub title_word: f32,
    /// Proportion of query bigrams present in the content, capped at 1.0
    #[serde(default = "default_content_bigram")]
    pub content_bigram: f32,
    /// Proportion of query words present in the content, capped at 1.0
    #[serde(default = "default_content_word")]
    pub content_word: f32,
    /// Full lower-cased query appears verbatim in the content
    #[serde(default = "default_exact_phrase")]
    pub exact_phrase: f32,
}

fn default_target_section() -> f32 {
    0.35
}

fn default_mapped_document() -> f32 {
    0.15
}

fn default_keyword_match() -> f32 {
    0.10
}

fn default_title_bigram() -> f32 {
    0.10
}

fn default_title_word() -> f32 {
    0.05
}

fn default_content_bigram() -> f32 {
    0.10
}

fn default_content_word() -> f32 {
    0.10
}

fn default_exact_phrase() -> f32 {
    0.05
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            target_section: default_target_section(),
            mapped_document: default_mapped_document(),
            keyword_match: default_keyword_match(),
            title_bigram: default_title_bigram(),
            title_word: default_title_word(),
            content_bigram: default_content_bigram(),
            content_word: default_content_word(),
            exact_phrase: default_exact_phrase(),
        }
    }
}

/// Adjacent word pairs from naive whitespace tokenization:
/// `["a", "b", "c"]` -> `{"a b", "b c"}`
pub fn bigrams(words: &[&str]) -> HashSet<String> {
    words
        .windows(2)
        .map(|pair| format!("{} {}", pair[0], pair[1]))
        .collect()
}

/// Compute the relevance score for a (query, chunk) pair.
///
/// Pure function of its inputs; identical inputs always yield the identical
/// score.
pub fn score_chunk(
    query: &str,
    chunk: &Chunk,
    is_mapped_document: bool,
    has_keyword_match: bool,
    in_target_section: bool,
    weights: &ScoreWeights,
) -> f32 {
    let mut score = 0.0f32;

    // Highest priority: chunk is in the exact target section
    if in_target_section {
        score += weights.target_section;
    }

    if is_mapped_document {
        score += weights.mapped_document;
    }

    if has_keyword_match {
        score += weights.keyword_match;
    }

    let query_lower = query.to_lowercase();
    let query_word_list: Vec<&str> = query_lower.split_whitespace().collect();
    let query_words: HashSet<&str> = query_word_list.iter().copied().collect();
    let query_bigrams = bigrams(&query_word_list);

    // Title matching (bigrams + words)
    let title_lower = chunk.title.to_lowercase();
    let title_word_list: Vec<&str> = title_lower.split_whitespace().collect();
    let title_words: HashSet<&str> = title_word_list.iter().copied().collect();
    let title_bigrams = bigrams(&title_word_list);

    if !query_bigrams.is_empty() && !title_bigrams.is_empty() {
        let overlap = query_bigrams.intersection(&title_bigrams).count();
        if overlap > 0 {
            score += (overlap as f32 / query_bigrams.len() as f32).min(1.0) * weights.title_bigram;
        }
    }

    if !query_words.is_empty() {
        let overlap = query_words.intersection(&title_words).count();
        score += (overlap as f32 / query_words.len() as f32) * weights.title_word;
    }

    // Content matching (bigrams + words)
    let content_lower = chunk.content.to_lowercase();
    let content_word_list: Vec<&str> = content_lower.split_whitespace().collect();
    let content_words: HashSet<&str> = content_word_list.iter().copied().collect();
    let content_bigrams = bigrams(&content_word_list);

    if !query_bigrams.is_empty() && !content_bigrams.is_empty() {
        let overlap = query_bigrams.intersection(&content_bigrams).count();
        if overlap > 0 {
            score +=
                (overlap as f32 / query_bigrams.len() as f32).min(1.0) * weights.content_bigram;
        }
    }

    if !query_words.is_empty() {
        let overlap = query_words.intersection(&content_words).count();
        if overlap > 0 {
            score += (overlap as f32 / query_words.len() as f32).min(1.0) * weights.content_word;
        }
    }

    // Exact phrase match bonus
    if content_lower.contains(&query_lower) {
        score += weights.exact_phrase;
    }

    score.clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunk(title: &str, content: &str) -> Chunk {
        Chunk {
            id: "doc_0".to_string(),
            title: title.to_string(),
            content: content.to_string(),
            parent: "Doc".to_string(),
            line_start: 0,
            line_end: 10,
        }
    }

    #[test]
    fn test_bigrams() {
        let grams = bigrams(&["a", "b", "c"]);
        assert_eq!(grams.len(), 2);
        assert!(grams.contains("a b"));
        assert!(grams.contains("b c"));
        assert!(bigrams(&["solo"]).is_empty());
    }

    #[test]
    fn test_score_bounds() {
        let c = chunk(
            "nghỉ phép năm",
            "nghỉ phép được bao nhiêu ngày nghỉ phép năm chi tiết",
        );
        let w = ScoreWeights::default();
        let score = score_chunk("nghỉ phép được bao nhiêu ngày", &c, true, true, true, &w);
        assert!((0.0..=1.0).contains(&score));
    }

    #[test]
    fn test_no_signals_zero_score() {
        let c = chunk("unrelated title", "entirely different words");
        let w = ScoreWeights::default();
        let score = score_chunk("nghỉ phép", &c, false, false, false, &w);
        assert_eq!(score, 0.0);
    }

    #[test]
    fn test_target_section_dominates_equal_overlap() {
        let a = chunk("Điều 11: Nghỉ phép năm", "NLĐ được 12 ngày phép");
        let b = a.clone();
        let w = ScoreWeights::default();

        let in_section = score_chunk("nghỉ phép", &a, true, true, true, &w);
        let out_of_section = score_chunk("nghỉ phép", &b, true, true, false, &w);
        assert!(in_section > out_of_section);
        assert!((in_section - out_of_section - w.target_section).abs() < 1e-6);
    }

    #[test]
    fn test_exact_phrase_bonus() {
        let with_phrase = chunk("title", "câu hỏi nghỉ phép năm nằm ở đây");
        let without = chunk("title", "câu trả lời nằm chỗ khác hẳn");
        let w = ScoreWeights::default();

        let s1 = score_chunk("nghỉ phép năm", &with_phrase, false, false, false, &w);
        let s2 = score_chunk("nghỉ phép năm", &without, false, false, false, &w);
        assert!(s1 > s2);
    }

    #[test]
    fn test_bigram_overlap_rewards_phrases() {
        // Same words scattered vs. adjacent: the phrase should score higher
        let phrase = chunk("title", "thời gian nghỉ phép hằng năm");
        let scattered = chunk("title", "phép thời nghỉ năm gian hằng");
        let w = ScoreWeights::default();

        let s_phrase = score_chunk("nghỉ phép hằng năm", &phrase, false, false, false, &w);
        let s_scattered = score_chunk("nghỉ phép hằng năm", &scattered, false, false, false, &w);
        assert!(s_phrase > s_scattered);
    }

    #[test]
    fn test_deterministic() {
        let c = chunk("Điều 11: Nghỉ phép năm", "12 ngày phép mỗi năm");
        let w = ScoreWeights::default();
        let a = score_chunk("nghỉ phép", &c, true, false, true, &w);
        let b = score_chunk("nghỉ phép", &c, true, false, true, &w);
        assert_eq!(a, b);
    }

    #[test]
    fn test_stacked_signals_clamped() {
        let c = chunk(
            "nghỉ phép nghỉ phép",
            "nghỉ phép nghỉ phép nghỉ phép nghỉ phép",
        );
        let w = ScoreWeights {
            target_section: 0.9,
            mapped_document: 0.9,
            ..Default::default()
        };
        let score = score_chunk("nghỉ phép", &c, true, true, true, &w);
        assert_eq!(score, 1.0);
    }
}
