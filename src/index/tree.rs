//! Hierarchical tree index
//!
//! One precomputed title/summary tree per document, produced by the offline
//! tree-building pipeline. This index only serves two reads: a compact
//! (text-stripped) view for the external reasoning call, and node lookup by id
//! to recover full text. Node *selection* is not done here.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// One node of a per-document outline.
#[derive(Debug, Clone, Deserialize)]
pub struct TreeNode {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub node_id: String,
    #[serde(default)]
    pub summary: Option<String>,
    /// Older tree files carry the summary under this key
    #[serde(default)]
    pub prefix_summary: Option<String>,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub nodes: Vec<TreeNode>,
}

impl TreeNode {
    /// Summary text, whichever key the tree file used
    pub fn summary_text(&self) -> &str {
        self.summary
            .as_deref()
            .or(self.prefix_summary.as_deref())
            .unwrap_or("")
    }
}

/// A per-document tree file: description plus the node forest.
#[derive(Debug, Clone, Deserialize)]
pub struct DocumentTree {
    #[serde(default)]
    pub doc_name: String,
    #[serde(default)]
    pub doc_description: String,
    #[serde(default)]
    pub structure: Vec<TreeNode>,
}

/// Compact node view: text stripped, children kept.
#[derive(Debug, Serialize)]
pub struct CompactNode {
    pub title: String,
    pub node_id: String,
    pub summary: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub nodes: Vec<CompactNode>,
}

/// Compact per-document view sent to the external reasoning call.
#[derive(Debug, Serialize)]
pub struct CompactTree {
    pub description: String,
    pub structure: Vec<CompactNode>,
}

/// Read-only store of document trees keyed by document id.
#[derive(Debug, Default)]
pub struct TreeIndex {
    trees: BTreeMap<String, DocumentTree>,
}

impl TreeIndex {
    /// Load every `<doc_id>_tree.json` under the given directory. Unreadable
    /// or malformed files are logged and skipped; a missing directory yields
    /// an empty index.
    pub fn load(trees_dir: &Path) -> Self {
        let entries = match std::fs::read_dir(trees_dir) {
            Ok(entries) => entries,
            Err(_) => return Self::default(),
        };

        let mut trees = BTreeMap::new();
        for entry in entries.flatten() {
            let path = entry.path();
            let Some(file_name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            let Some(doc_id) = file_name.strip_suffix("_tree.json") else {
                continue;
            };

            let content = match std::fs::read_to_string(&path) {
                Ok(content) => content,
                Err(e) => {
                    tracing::warn!("Failed to read tree {:?}: {}", path, e);
                    continue;
                }
            };
            match serde_json::from_str::<DocumentTree>(&content) {
                Ok(tree) => {
                    trees.insert(doc_id.to_string(), tree);
                }
                Err(e) => {
                    tracing::warn!("Failed to parse tree {:?}: {}", path, e);
                }
            }
        }

        Self { trees }
    }

    pub fn is_empty(&self) -> bool {
        self.trees.is_empty()
    }

    pub fn tree_count(&self) -> usize {
        self.trees.len()
    }

    /// Total nodes across all trees
    pub fn node_count(&self) -> usize {
        self.trees
            .values()
            .map(|t| count_nodes(&t.structure))
            .sum()
    }

    pub fn get(&self, doc_id: &str) -> Option<&DocumentTree> {
        self.trees.get(doc_id)
    }

    /// Compact (text-stripped) forest for every document passing the filter.
    /// Documents with an empty structure are omitted.
    pub fn compact_view(&self, document_filter: Option<&str>) -> BTreeMap<String, CompactTree> {
        let mut view = BTreeMap::new();
        for (doc_id, tree) in &self.trees {
            if let Some(filter_id) = document_filter {
                if filter_id != doc_id {
                    continue;
                }
            }
            let structure = strip_tree_text(&tree.structure);
            if structure.is_empty() {
                continue;
            }
            view.insert(
                doc_id.clone(),
                CompactTree {
                    description: tree.doc_description.clone(),
                    structure,
                },
            );
        }
        view
    }

    /// Find a node by exact id, depth-first over children.
    pub fn find_node(&self, doc_id: &str, node_id: &str) -> Option<&TreeNode> {
        self.trees
            .get(doc_id)
            .and_then(|tree| find_node_by_id(&tree.structure, node_id))
    }
}

fn strip_tree_text(nodes: &[TreeNode]) -> Vec<CompactNode> {
    nodes
        .iter()
        .map(|node| CompactNode {
            title: node.title.clone(),
            node_id: node.node_id.clone(),
            summary: node.summary_text().to_string(),
            nodes: strip_tree_text(&node.nodes),
        })
        .collect()
}

fn find_node_by_id<'a>(nodes: &'a [TreeNode], target_id: &str) -> Option<&'a TreeNode> {
    for node in nodes {
        if node.node_id == target_id {
            return Some(node);
        }
        if let Some(found) = find_node_by_id(&node.nodes, target_id) {
            return Some(found);
        }
    }
    None
}

fn count_nodes(nodes: &[TreeNode]) -> usize {
    nodes.len() + nodes.iter().map(|n| count_nodes(&n.nodes)).sum::<usize>()
}
