//! Polidex - Policy Document Retrieval Engine
//!
//! A hybrid retrieval engine that answers natural-language questions against a
//! corpus of internal policy documents: header-aware chunking, keyword and
//! curated query-mapping indexes, multi-signal relevance scoring,
//! structured-entity lookup, hierarchical tree navigation via an external
//! reasoning call, and result fusion with near-duplicate removal.

pub mod cli;
pub mod config;
pub mod corpus;
pub mod error;
pub mod index;
pub mod reasoning;
pub mod retrieval;

pub use error::{PolidexError, Result};
