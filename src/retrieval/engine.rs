//! Hybrid retrieval orchestrator
//!
//! Fans out over the fixed set of strategies (structured-entity lookup, tree
//! reasoning, legacy keyword/chunk scoring), merges their candidates,
//! deduplicates, and ranks. Every index is built once at initialization and
//! read-only afterward; reloading means building a new retriever and swapping
//! the owning reference.

use crate::config::{Config, RetrievalConfig};
use crate::corpus::Corpus;
use crate::error::Result;
use crate::index::{EntityIndex, KeywordIndex, TreeIndex};
use crate::reasoning::NodeSelector;
use crate::retrieval::{
    deduplicate_chunks, lexical_search, KnowledgeChunk, QueryFilters, RetrievalResult,
};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Report on loaded data and the active retrieval mode
#[derive(Debug, Serialize)]
pub struct EngineStatus {
    pub document_count: usize,
    pub chunk_count: usize,
    pub tree_count: usize,
    pub tree_node_count: usize,
    pub entity_count: usize,
    pub mode: String,
}

/// The retrieval engine: owns all indexes plus the external reasoning
/// boundary. No shared mutable state; concurrent `retrieve` calls are
/// independent.
pub struct HybridRetriever {
    corpus: Corpus,
    keywords: KeywordIndex,
    entities: EntityIndex,
    trees: TreeIndex,
    selector: Option<Arc<dyn NodeSelector>>,
    config: RetrievalConfig,
}

impl HybridRetriever {
    /// Bulk-load every index from the configured paths.
    ///
    /// Safe to call again: the result is a complete replacement engine, to be
    /// swapped in place of the old one. Missing enhancement data (entities,
    /// trees) only narrows the strategy set, it never fails the load.
    pub fn initialize(config: &Config, selector: Option<Arc<dyn NodeSelector>>) -> Result<Self> {
        let corpus = Corpus::load(&config.corpus.corpus_dir)?;
        let keywords = KeywordIndex::build(&corpus);
        let entities = EntityIndex::load(&config.corpus.entities_file);
        let trees = TreeIndex::load(&config.corpus.trees_dir);

        if trees.is_empty() && entities.is_empty() {
            tracing::info!("Enhancement indexes not found, keyword mode only");
        } else {
            tracing::info!(
                "Enhanced mode active: {} trees ({} nodes), {} entities",
                trees.tree_count(),
                trees.node_count(),
                entities.entity_count()
            );
        }

        Ok(Self::new(
            corpus,
            keywords,
            entities,
            trees,
            selector,
            config.retrieval.clone(),
        ))
    }

    /// Assemble an engine from already-built components
    pub fn new(
        corpus: Corpus,
        keywords: KeywordIndex,
        entities: EntityIndex,
        trees: TreeIndex,
        selector: Option<Arc<dyn NodeSelector>>,
        config: RetrievalConfig,
    ) -> Self {
        Self {
            corpus,
            keywords,
            entities,
            trees,
            selector,
            config,
        }
    }

    pub fn corpus(&self) -> &Corpus {
        &self.corpus
    }

    /// Hybrid retrieval across all available strategies.
    ///
    /// Partial strategy failure degrades to an empty contribution from that
    /// strategy; no candidates at all yields an empty result, never an error.
    pub async fn retrieve(
        &self,
        query: &str,
        top_k: usize,
        filters: &QueryFilters,
    ) -> RetrievalResult {
        // Minimum-viable path: no enhancement data loaded at all
        if self.entities.is_empty() && self.trees.is_empty() {
            return lexical_search(
                &self.corpus,
                &self.keywords,
                &self.config.weights,
                query,
                top_k,
                filters,
            );
        }

        // The three strategies are independent; only the tree lookup blocks on
        // external I/O, so run them joined
        let (entity_chunks, tree_chunks, legacy_result) = tokio::join!(
            async {
                self.entities.lookup(
                    query,
                    filters.document_id.as_deref(),
                    self.config.entity_score_threshold,
                )
            },
            self.tree_lookup(query, filters),
            async {
                lexical_search(
                    &self.corpus,
                    &self.keywords,
                    &self.config.weights,
                    query,
                    self.config.legacy_top_k,
                    filters,
                )
            },
        );

        let mut candidates: Vec<KnowledgeChunk> = Vec::new();
        candidates.extend(entity_chunks);
        candidates.extend(tree_chunks);

        // De-prioritize the generic fallback once higher-precision strategies
        // have produced anything
        let have_enhanced = !candidates.is_empty();
        for mut chunk in legacy_result.chunks {
            if have_enhanced {
                chunk.score *= self.config.legacy_damping;
            }
            candidates.push(chunk);
        }

        let mut accepted = deduplicate_chunks(candidates, self.config.dedup_overlap_threshold);
        accepted.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));

        let total_found = accepted.len();
        accepted.truncate(top_k);

        RetrievalResult {
            chunks: accepted,
            query: query.to_string(),
            total_found,
        }
    }

    /// Tree-reasoning strategy: compact forest out, node references back,
    /// full node text resolved locally. Best-effort; every failure is logged
    /// and swallowed.
    async fn tree_lookup(&self, query: &str, filters: &QueryFilters) -> Vec<KnowledgeChunk> {
        if self.trees.is_empty() {
            return Vec::new();
        }
        let Some(selector) = &self.selector else {
            tracing::debug!("No node selector configured, skipping tree strategy");
            return Vec::new();
        };

        let compact = self.trees.compact_view(filters.document_id.as_deref());
        if compact.is_empty() {
            return Vec::new();
        }

        let forest_repr = match serde_json::to_string_pretty(&compact) {
            Ok(repr) => truncate_chars(repr, self.config.max_compact_tree_chars),
            Err(e) => {
                tracing::warn!("Failed to serialize compact forest: {}", e);
                return Vec::new();
            }
        };

        let selections = match selector.select_nodes(&forest_repr, query).await {
            Ok(selections) => selections,
            Err(e) => {
                tracing::warn!("Tree reasoning failed, skipping: {}", e);
                return Vec::new();
            }
        };

        let mut chunks = Vec::new();
        for selection in selections.into_iter().take(3) {
            let Some(node) = self.trees.find_node(&selection.doc_id, &selection.node_id) else {
                continue;
            };
            if node.text.is_empty() {
                continue;
            }

            let doc_name = self
                .trees
                .get(&selection.doc_id)
                .map(|t| t.doc_name.as_str())
                .filter(|name| !name.is_empty())
                .unwrap_or(selection.doc_id.as_str());

            let mut metadata = BTreeMap::new();
            metadata.insert("doc_id".to_string(), selection.doc_id.clone());
            metadata.insert("node_id".to_string(), selection.node_id.clone());
            metadata.insert("strategy".to_string(), "tree_reasoning".to_string());

            chunks.push(KnowledgeChunk {
                content: node.text.clone(),
                source: format!("{} - {}", doc_name, node.title),
                metadata,
                score: selection.relevance.score(),
            });
        }

        chunks
    }

    /// Report which enhancement data is loaded and the resulting mode
    pub fn status(&self) -> EngineStatus {
        let has_trees = !self.trees.is_empty();
        let has_entities = !self.entities.is_empty();
        let mode = match (has_trees, has_entities) {
            (true, true) => "hybrid (trees + entities)",
            (true, false) => "hybrid (trees only)",
            (false, true) => "hybrid (entities only)",
            (false, false) => "keyword only",
        };

        EngineStatus {
            document_count: self.corpus.document_count(),
            chunk_count: self.corpus.chunk_count(),
            tree_count: self.trees.tree_count(),
            tree_node_count: self.trees.node_count(),
            entity_count: self.entities.entity_count(),
            mode: mode.to_string(),
        }
    }
}

/// Truncate on a character boundary and mark the cut
fn truncate_chars(repr: String, max_chars: usize) -> String {
    if repr.chars().count() <= max_chars {
        return repr;
    }
    let mut truncated: String = repr.chars().take(max_chars).collect();
    truncated.push_str("\n... (truncated)");
    truncated
}
