//! Keyword and curated query-mapping index
//!
//! Maps document keywords and hand-authored query phrases to candidate
//! documents and sections. All matching is case-insensitive substring
//! containment: a curated phrase inside a longer query still matches.

use crate::corpus::Corpus;
use regex::Regex;
use std::collections::{BTreeMap, BTreeSet};

/// Article reference in a chunk title, e.g. "Điều 11: Nghỉ phép năm"
const ARTICLE_PATTERN: &str = r"(?:Điều|Article)\s+(\d+)";

/// Lookup tables built from the corpus index: keywords, curated query-phrase
/// mappings, and the section -> article-number membership lists.
#[derive(Debug)]
pub struct KeywordIndex {
    /// lowercased keyword -> document ids
    keywords: BTreeMap<String, Vec<String>>,
    /// curated phrase -> ["doc_id#section_id", ...]
    query_mappings: BTreeMap<String, Vec<String>>,
    /// "doc_id#section_id" -> declared article numbers
    section_articles: BTreeMap<String, Vec<String>>,
    article_re: Regex,
}

impl KeywordIndex {
    /// Build the index from a loaded corpus
    pub fn build(corpus: &Corpus) -> Self {
        let mut keywords: BTreeMap<String, Vec<String>> = BTreeMap::new();
        let mut section_articles: BTreeMap<String, Vec<String>> = BTreeMap::new();

        for doc in corpus.documents() {
            for keyword in &doc.keywords {
                keywords
                    .entry(keyword.to_lowercase())
                    .or_default()
                    .push(doc.id.clone());
            }
            for section in &doc.sections {
                section_articles.insert(
                    format!("{}#{}", doc.id, section.id),
                    section.articles.clone(),
                );
            }
        }

        Self {
            keywords,
            query_mappings: corpus.query_mappings().clone(),
            section_articles,
            // The pattern is a literal, it cannot fail to compile
            article_re: Regex::new(ARTICLE_PATTERN).expect("invalid article pattern"),
        }
    }

    /// Documents whose keyword appears as a substring of the query or of any
    /// individual query token. Returns ids sorted and deduplicated.
    pub fn matched_documents(&self, query: &str) -> Vec<String> {
        let query = query.to_lowercase();
        let query_words: Vec<&str> = query.split_whitespace().collect();

        let mut matched = BTreeSet::new();
        for (keyword, doc_ids) in &self.keywords {
            if query.contains(keyword.as_str())
                || query_words.iter().any(|word| word.contains(keyword.as_str()))
            {
                matched.extend(doc_ids.iter().cloned());
            }
        }

        matched.into_iter().collect()
    }

    /// Documents and their target sections from the curated query mappings.
    ///
    /// Returns `doc_id -> [section_id]` for every curated phrase contained in
    /// the query.
    pub fn mapped_sections(&self, query: &str) -> BTreeMap<String, Vec<String>> {
        let query = query.to_lowercase();

        let mut matched: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for (phrase, doc_refs) in &self.query_mappings {
            if !query.contains(phrase.to_lowercase().as_str()) {
                continue;
            }
            for doc_ref in doc_refs {
                let (doc_id, section_id) = match doc_ref.split_once('#') {
                    Some((doc, section)) => (doc, Some(section)),
                    None => (doc_ref.as_str(), None),
                };
                let sections = matched.entry(doc_id.to_string()).or_default();
                if let Some(section_id) = section_id {
                    if !sections.iter().any(|s| s == section_id) {
                        sections.push(section_id.to_string());
                    }
                }
            }
        }

        matched
    }

    /// Whether a chunk belongs to one of the target sections: its title must
    /// carry an article number that the section declares as a member.
    pub fn chunk_in_target_section(
        &self,
        chunk_title: &str,
        doc_id: &str,
        target_sections: &[String],
    ) -> bool {
        if target_sections.is_empty() {
            return false;
        }

        let article_num = match self
            .article_re
            .captures(chunk_title)
            .and_then(|caps| caps.get(1))
        {
            Some(m) => m.as_str(),
            None => return false,
        };

        target_sections.iter().any(|section_id| {
            self.section_articles
                .get(&format!("{}#{}", doc_id, section_id))
                .map(|articles| articles.iter().any(|a| a == article_num))
                .unwrap_or(false)
        })
    }
}
