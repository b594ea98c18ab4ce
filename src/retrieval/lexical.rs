//! Legacy keyword/chunk retrieval strategy
//!
//! Scores every chunk of the keyword- or mapping-matched documents (all
//! documents when nothing matched) with the multi-signal relevance function.
//! This path needs no enhancement data and must work on a bare corpus.

use crate::corpus::Corpus;
use crate::index::KeywordIndex;
use crate::retrieval::scorer::{score_chunk, ScoreWeights};
use crate::retrieval::{KnowledgeChunk, QueryFilters, RetrievalResult};
use std::collections::{BTreeMap, BTreeSet};

/// Run the keyword/chunk strategy and return the top-k scored chunks.
///
/// `total_found` reports the number of positively scored chunks before
/// truncation.
pub fn lexical_search(
    corpus: &Corpus,
    index: &KeywordIndex,
    weights: &ScoreWeights,
    query: &str,
    top_k: usize,
    filters: &QueryFilters,
) -> RetrievalResult {
    let mapped_sections = index.mapped_sections(query);
    let keyword_docs = index.matched_documents(query);

    // Combine both match sets; fall back to the whole corpus
    let mut relevant: BTreeSet<String> = mapped_sections.keys().cloned().collect();
    relevant.extend(keyword_docs.iter().cloned());
    if relevant.is_empty() {
        relevant = corpus.documents().map(|d| d.id.clone()).collect();
    }

    let mut scored: Vec<KnowledgeChunk> = Vec::new();

    for doc_id in &relevant {
        let Some(doc) = corpus.get(doc_id) else {
            continue;
        };

        if let Some(filter_id) = &filters.document_id {
            if filter_id != doc_id {
                continue;
            }
        }

        let no_targets = Vec::new();
        let target_sections = mapped_sections.get(doc_id).unwrap_or(&no_targets);
        let is_mapped = mapped_sections.contains_key(doc_id);
        let has_keyword = keyword_docs.contains(doc_id);

        for chunk in &doc.chunks {
            let in_target_section =
                index.chunk_in_target_section(&chunk.title, doc_id, target_sections);

            let score = score_chunk(
                query,
                chunk,
                is_mapped,
                has_keyword,
                in_target_section,
                weights,
            );
            if score <= 0.0 {
                continue;
            }

            let mut metadata = BTreeMap::new();
            metadata.insert("doc_id".to_string(), doc_id.clone());
            metadata.insert("chunk_id".to_string(), chunk.id.clone());
            metadata.insert("title".to_string(), chunk.title.clone());
            metadata.insert("parent".to_string(), chunk.parent.clone());
            metadata.insert("effective_date".to_string(), doc.effective_date.clone());
            metadata.insert("strategy".to_string(), "keyword_chunk".to_string());

            scored.push(KnowledgeChunk {
                content: chunk.content.clone(),
                source: format!("{} - {}", doc.title, chunk.title),
                metadata,
                score,
            });
        }
    }

    scored.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
    let total_found = scored.len();
    scored.truncate(top_k);

    RetrievalResult {
        chunks: scored,
        query: query.to_string(),
        total_found,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn build_fixture() -> (Corpus, KeywordIndex) {
        let temp = TempDir::new().unwrap();
        let index = serde_json::json!({
            "documents": [
                {
                    "id": "noi_quy",
                    "file": "noi_quy.md",
                    "title": "Nội quy lao động",
                    "description": "Quy định lao động công ty",
                    "keywords": ["nghỉ phép"],
                    "sections": [
                        {"id": "nghi_phep", "articles": ["11"]}
                    ]
                },
                {
                    "id": "quy_che",
                    "file": "quy_che.md",
                    "title": "Quy chế thưởng",
                    "keywords": ["thưởng"]
                }
            ],
            "query_mappings": {
                "nghỉ phép": ["noi_quy#nghi_phep"]
            }
        });
        fs::write(temp.path().join("index.json"), index.to_string()).unwrap();
        fs::write(
            temp.path().join("noi_quy.md"),
            "# Nội quy lao động\n\n## Điều 10: Giờ làm việc\n\nLàm việc từ 8h00.\n\n\
             ## Điều 11: Nghỉ phép năm\n\nNLĐ được 12 ngày nghỉ phép mỗi năm.",
        )
        .unwrap();
        fs::write(
            temp.path().join("quy_che.md"),
            "# Quy chế thưởng\n\n## Điều 1: Thưởng tết\n\nThưởng theo kết quả kinh doanh.",
        )
        .unwrap();

        let corpus = Corpus::load(temp.path()).unwrap();
        let index = KeywordIndex::build(&corpus);
        (corpus, index)
    }

    #[test]
    fn test_target_section_chunk_ranked_first() {
        let (corpus, index) = build_fixture();
        let weights = ScoreWeights::default();
        let result = lexical_search(
            &corpus,
            &index,
            &weights,
            "nghỉ phép được bao nhiêu ngày",
            5,
            &QueryFilters::default(),
        );

        assert!(result.total_found >= 1);
        let best = &result.chunks[0];
        assert_eq!(best.metadata.get("chunk_id").unwrap(), "noi_quy_1");
        assert!(best.source.contains("Điều 11"));
    }

    #[test]
    fn test_top_k_contract() {
        let (corpus, index) = build_fixture();
        let weights = ScoreWeights::default();
        let result = lexical_search(
            &corpus,
            &index,
            &weights,
            "nghỉ phép được bao nhiêu ngày",
            1,
            &QueryFilters::default(),
        );

        assert!(result.chunks.len() <= 1);
        assert!(result.total_found >= result.chunks.len());
    }

    #[test]
    fn test_document_filter() {
        let (corpus, index) = build_fixture();
        let weights = ScoreWeights::default();
        let filters = QueryFilters {
            document_id: Some("quy_che".to_string()),
        };
        let result = lexical_search(&corpus, &index, &weights, "nghỉ phép", 5, &filters);

        for chunk in &result.chunks {
            assert_eq!(chunk.metadata.get("doc_id").unwrap(), "quy_che");
        }
    }

    #[test]
    fn test_unmatched_query_searches_all_documents() {
        let (corpus, index) = build_fixture();
        let weights = ScoreWeights::default();
        // No keyword or mapping matches, but word overlap still scores
        let result = lexical_search(
            &corpus,
            &index,
            &weights,
            "kết quả kinh doanh",
            5,
            &QueryFilters::default(),
        );

        assert!(result
            .chunks
            .iter()
            .any(|c| c.metadata.get("doc_id").unwrap() == "quy_che"));
    }

    #[test]
    fn test_empty_corpus_returns_empty_result() {
        let temp = TempDir::new().unwrap();
        let corpus = Corpus::load(temp.path()).unwrap();
        let index = KeywordIndex::build(&corpus);
        let weights = ScoreWeights::default();

        let result = lexical_search(
            &corpus,
            &index,
            &weights,
            "nghỉ phép",
            5,
            &QueryFilters::default(),
        );
        assert!(result.chunks.is_empty());
        assert_eq!(result.total_found, 0);
    }

    #[test]
    fn test_deterministic_ordering() {
        let (corpus, index) = build_fixture();
        let weights = ScoreWeights::default();
        let run = || {
            lexical_search(
                &corpus,
                &index,
                &weights,
                "nghỉ phép được bao nhiêu ngày",
                5,
                &QueryFilters::default(),
            )
        };
        let a = run();
        let b = run();
        let ids =
            |r: &RetrievalResult| -> Vec<String> {
                r.chunks
                    .iter()
                    .map(|c| c.metadata.get("chunk_id").unwrap().clone())
                    .collect()
            };
        assert_eq!(ids(&a), ids(&b));
    }
}
