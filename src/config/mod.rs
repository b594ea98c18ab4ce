//! Configuration management for Polidex
//!
//! Handles loading, validation, and defaults for the retrieval engine
//! configuration: corpus locations, scoring weights, and the external
//! reasoning client.

use crate::error::{PolidexError, Result};
use crate::retrieval::scorer::ScoreWeights;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

mod validator;

pub use validator::ConfigValidator;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(rename = "_meta", default)]
    pub meta: MetaConfig,
    #[serde(default)]
    pub corpus: CorpusConfig,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    #[serde(default)]
    pub reasoning: ReasoningConfig,
}

/// Metadata about the configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetaConfig {
    #[serde(default = "default_schema_version")]
    pub schema_version: String,
    #[serde(default = "current_timestamp")]
    pub created_at: String,
    #[serde(default = "current_timestamp")]
    pub last_modified: String,
}

fn default_schema_version() -> String {
    "1.0.0".to_string()
}

fn current_timestamp() -> String {
    chrono::Utc::now().to_rfc3339()
}

impl Default for MetaConfig {
    fn default() -> Self {
        Self {
            schema_version: default_schema_version(),
            created_at: current_timestamp(),
            last_modified: current_timestamp(),
        }
    }
}

/// Corpus locations: the document directory plus the pre-computed indexes
/// produced by the offline extraction/tree pipelines.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorpusConfig {
    /// Directory holding index.json and the markdown documents
    pub corpus_dir: PathBuf,
    /// Directory holding `<doc_id>_tree.json` files
    pub trees_dir: PathBuf,
    /// Path to the structured entities file
    pub entities_file: PathBuf,
}

impl Default for CorpusConfig {
    fn default() -> Self {
        let base = PathBuf::from("knowledge");
        Self {
            corpus_dir: base.clone(),
            trees_dir: base.join("indexed"),
            entities_file: base.join("extracted").join("entities.json"),
        }
    }
}

/// Retrieval tuning. The weights and thresholds are hand-tuned values carried
/// over from the source system; they are exposed here so deployments can
/// override them without recompiling.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalConfig {
    /// Default number of chunks returned by a query
    #[serde(default = "default_top_k")]
    pub top_k: usize,
    /// Result cap for the legacy keyword/chunk strategy inside the hybrid path
    #[serde(default = "default_legacy_top_k")]
    pub legacy_top_k: usize,
    /// Multiplier applied to legacy scores once enhanced strategies produced results
    #[serde(default = "default_legacy_damping")]
    pub legacy_damping: f32,
    /// Entities scoring at or below this are dropped
    #[serde(default = "default_entity_score_threshold")]
    pub entity_score_threshold: f32,
    /// Word-overlap ratio above which two chunks count as near-duplicates
    #[serde(default = "default_dedup_overlap_threshold")]
    pub dedup_overlap_threshold: f32,
    /// Serialized compact-tree size cap sent to the reasoning call
    #[serde(default = "default_max_compact_tree_chars")]
    pub max_compact_tree_chars: usize,
    /// Relevance scoring weights
    #[serde(default)]
    pub weights: ScoreWeights,
}

fn default_top_k() -> usize {
    5
}

fn default_legacy_top_k() -> usize {
    2
}

fn default_legacy_damping() -> f32 {
    0.7
}

fn default_entity_score_threshold() -> f32 {
    0.3
}

fn default_dedup_overlap_threshold() -> f32 {
    0.6
}

fn default_max_compact_tree_chars() -> usize {
    8_000
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: default_top_k(),
            legacy_top_k: default_legacy_top_k(),
            legacy_damping: default_legacy_damping(),
            entity_score_threshold: default_entity_score_threshold(),
            dedup_overlap_threshold: default_dedup_overlap_threshold(),
            max_compact_tree_chars: default_max_compact_tree_chars(),
            weights: ScoreWeights::default(),
        }
    }
}

/// External reasoning capability (tree-node selection)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReasoningConfig {
    /// When false the tree strategy is skipped entirely
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_reasoning_model")]
    pub model: String,
    /// Environment variable holding the API key
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
    /// Request timeout; expiry counts as a normal strategy failure
    #[serde(default = "default_reasoning_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_reasoning_model() -> String {
    "gemini-2.5-flash".to_string()
}

fn default_api_key_env() -> String {
    "GOOGLE_API_KEY".to_string()
}

fn default_reasoning_timeout_secs() -> u64 {
    20
}

impl Default for ReasoningConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            model: default_reasoning_model(),
            api_key_env: default_api_key_env(),
            timeout_secs: default_reasoning_timeout_secs(),
        }
    }
}

impl Config {
    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(PolidexError::ConfigNotFound {
                path: path.to_path_buf(),
            });
        }

        let content = std::fs::read_to_string(path).map_err(|e| PolidexError::Io {
            source: e,
            context: format!("Failed to read config file: {:?}", path),
        })?;
        let mut config: Config = toml::from_str(&content)?;

        // Apply environment variable overrides
        config.apply_env_overrides();

        // Validate configuration
        ConfigValidator::validate(&config)?;

        Ok(config)
    }

    /// Save configuration to a file
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content).map_err(|e| PolidexError::Io {
            source: e,
            context: format!("Failed to write config file: {:?}", path),
        })?;
        Ok(())
    }

    /// Apply environment variable overrides
    /// Environment variables in format: POLIDEX_SECTION__KEY=value
    pub fn apply_env_overrides(&mut self) {
        for (key, value) in std::env::vars() {
            if let Some(config_key) = key.strip_prefix("POLIDEX_") {
                if let Err(e) = self.set_value_from_env(config_key, &value) {
                    tracing::warn!("Failed to apply env override {}: {}", key, e);
                }
            }
        }
    }

    fn set_value_from_env(&mut self, path: &str, value: &str) -> Result<()> {
        match path {
            "REASONING__ENABLED" => {
                self.reasoning.enabled =
                    value.parse().map_err(|_| PolidexError::InvalidConfigValue {
                        path: path.to_string(),
                        message: format!("Cannot parse '{}' as boolean", value),
                    })?;
            }
            "REASONING__MODEL" => {
                self.reasoning.model = value.to_string();
            }
            "RETRIEVAL__TOP_K" => {
                self.retrieval.top_k =
                    value.parse().map_err(|_| PolidexError::InvalidConfigValue {
                        path: path.to_string(),
                        message: format!("Cannot parse '{}' as integer", value),
                    })?;
            }
            "CORPUS__CORPUS_DIR" => {
                self.corpus.corpus_dir = PathBuf::from(value);
            }
            _ => {
                tracing::debug!("Unknown env config key: {}", path);
            }
        }
        Ok(())
    }

    /// Get the default configuration file path
    pub fn default_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| PolidexError::Config("Cannot determine config directory".to_string()))?;

        Ok(config_dir.join("polidex").join("config.toml"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        assert!(ConfigValidator::validate(&config).is_ok());
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let toml_str = r#"
            [corpus]
            corpus_dir = "/data/regulations"
            trees_dir = "/data/regulations/indexed"
            entities_file = "/data/regulations/extracted/entities.json"
        "#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.retrieval.top_k, 5);
        assert_eq!(config.retrieval.legacy_damping, 0.7);
        assert_eq!(config.corpus.corpus_dir, PathBuf::from("/data/regulations"));
        assert!(!config.reasoning.enabled);
    }

    #[test]
    fn test_roundtrip() {
        let config = Config::default();
        let serialized = toml::to_string_pretty(&config).unwrap();
        let parsed: Config = toml::from_str(&serialized).unwrap();
        assert_eq!(parsed.retrieval.top_k, config.retrieval.top_k);
        assert_eq!(parsed.reasoning.model, config.reasoning.model);
    }
}
