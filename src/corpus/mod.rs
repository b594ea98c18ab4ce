//! Policy document corpus
//!
//! Loads `index.json` plus the markdown documents it references, chunks each
//! document along its headers, and holds everything as an immutable in-memory
//! store for the life of the process. Reloading means building a fresh
//! [`Corpus`] and swapping the owning reference.

mod chunker;

pub use chunker::{chunk_document, Chunk};

use crate::error::{PolidexError, Result};
use serde::de::{self, Deserializer, SeqAccess, Visitor};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

/// A declared document section mapping curated query phrases to the
/// article/unit numbers that satisfy them.
#[derive(Debug, Clone, Deserialize)]
pub struct Section {
    pub id: String,
    #[serde(default)]
    pub title: String,
    /// Article numbers covered by this section; index files may write them as
    /// JSON numbers or strings, normalized to strings here
    #[serde(default, deserialize_with = "string_or_number_seq")]
    pub articles: Vec<String>,
}

/// One loaded policy document. Immutable after load.
#[derive(Debug, Clone)]
pub struct Document {
    pub id: String,
    pub title: String,
    pub description: String,
    pub keywords: Vec<String>,
    pub sections: Vec<Section>,
    pub effective_date: String,
    pub content: String,
    pub chunks: Vec<Chunk>,
}

/// id/title/description view used by listings
#[derive(Debug, Clone, serde::Serialize)]
pub struct DocumentSummary {
    pub id: String,
    pub title: String,
    pub description: String,
}

#[derive(Debug, Deserialize)]
struct IndexFile {
    #[serde(default)]
    documents: Vec<DocumentEntry>,
    #[serde(default)]
    query_mappings: BTreeMap<String, Vec<String>>,
}

#[derive(Debug, Deserialize)]
struct DocumentEntry {
    id: String,
    file: String,
    title: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    keywords: Vec<String>,
    #[serde(default)]
    sections: Vec<Section>,
    #[serde(default)]
    effective_date: String,
}

/// Immutable document store built once per (re)initialization.
#[derive(Debug, Default)]
pub struct Corpus {
    documents: BTreeMap<String, Document>,
    query_mappings: BTreeMap<String, Vec<String>>,
}

impl Corpus {
    /// Load all documents listed in `<corpus_dir>/index.json`.
    ///
    /// A missing index or missing document file is logged and skipped, never
    /// fatal: the engine must stay usable with whatever loaded.
    pub fn load(corpus_dir: &Path) -> Result<Self> {
        let index_path = corpus_dir.join("index.json");
        if !index_path.exists() {
            tracing::warn!("Corpus index not found: {:?}", index_path);
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(&index_path).map_err(|e| PolidexError::Io {
            source: e,
            context: format!("Failed to read corpus index: {:?}", index_path),
        })?;
        let index: IndexFile = serde_json::from_str(&content).map_err(|e| PolidexError::Json {
            source: e,
            context: format!("Failed to parse corpus index: {:?}", index_path),
        })?;

        let mut documents = BTreeMap::new();
        for entry in index.documents {
            let doc_path = corpus_dir.join(&entry.file);
            let content = match std::fs::read_to_string(&doc_path) {
                Ok(content) => content,
                Err(e) => {
                    tracing::warn!("Document not found, skipping: {:?}: {}", doc_path, e);
                    continue;
                }
            };

            let chunks = chunk_document(&content, &entry.id);
            documents.insert(
                entry.id.clone(),
                Document {
                    id: entry.id,
                    title: entry.title,
                    description: entry.description,
                    keywords: entry.keywords,
                    sections: entry.sections,
                    effective_date: entry.effective_date,
                    content,
                    chunks,
                },
            );
        }

        tracing::info!(
            "Loaded {} documents with {} chunks",
            documents.len(),
            documents.values().map(|d| d.chunks.len()).sum::<usize>()
        );

        Ok(Self {
            documents,
            query_mappings: index.query_mappings,
        })
    }

    /// Get a document by id
    pub fn get(&self, doc_id: &str) -> Option<&Document> {
        self.documents.get(doc_id)
    }

    /// Iterate all documents in id order
    pub fn documents(&self) -> impl Iterator<Item = &Document> {
        self.documents.values()
    }

    /// Curated query-phrase mappings (`phrase -> ["doc_id#section_id", ...]`)
    pub fn query_mappings(&self) -> &BTreeMap<String, Vec<String>> {
        &self.query_mappings
    }

    /// Full raw text of a document
    pub fn full_content(&self, doc_id: &str) -> Option<&str> {
        self.documents.get(doc_id).map(|d| d.content.as_str())
    }

    /// id/title/description of every loaded document
    pub fn list(&self) -> Vec<DocumentSummary> {
        self.documents
            .values()
            .map(|d| DocumentSummary {
                id: d.id.clone(),
                title: d.title.clone(),
                description: d.description.clone(),
            })
            .collect()
    }

    pub fn document_count(&self) -> usize {
        self.documents.len()
    }

    pub fn chunk_count(&self) -> usize {
        self.documents.values().map(|d| d.chunks.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}

/// Accept `[11, "12"]` style article lists
fn string_or_number_seq<'de, D>(deserializer: D) -> std::result::Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    struct SeqVisitor;

    impl<'de> Visitor<'de> for SeqVisitor {
        type Value = Vec<String>;

        fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
            formatter.write_str("a sequence of strings or numbers")
        }

        fn visit_seq<A>(self, mut seq: A) -> std::result::Result<Self::Value, A::Error>
        where
            A: SeqAccess<'de>,
        {
            let mut values = Vec::new();
            while let Some(value) = seq.next_element::<serde_json::Value>()? {
                match value {
                    serde_json::Value::String(s) => values.push(s),
                    serde_json::Value::Number(n) => values.push(n.to_string()),
                    other => {
                        return Err(de::Error::custom(format!(
                            "expected string or number, got {}",
                            other
                        )))
                    }
                }
            }
            Ok(values)
        }
    }

    deserializer.deserialize_seq(SeqVisitor)
}
