use crate::config::Config;
use crate::error::{PolidexError, Result, ValidationError};

/// Configuration validator
pub struct ConfigValidator;

impl ConfigValidator {
    /// Validate the configuration
    pub fn validate(config: &Config) -> Result<()> {
        let mut errors = Vec::new();

        Self::validate_schema_version(config, &mut errors);
        Self::validate_corpus(config, &mut errors);
        Self::validate_retrieval(config, &mut errors);
        Self::validate_reasoning(config, &mut errors);

        if errors.is_empty() {
            Ok(())
        } else {
            Err(PolidexError::ConfigValidation { errors })
        }
    }

    fn validate_schema_version(config: &Config, errors: &mut Vec<ValidationError>) {
        let version = &config.meta.schema_version;
        if version != "1.0.0" {
            errors.push(ValidationError::new(
                "_meta.schema_version",
                format!("Unsupported schema version: {}", version),
            ));
        }
    }

    fn validate_corpus(config: &Config, errors: &mut Vec<ValidationError>) {
        // Existence is not checked here: paths may not exist until the offline
        // pipelines have run, and the loaders degrade gracefully on missing
        // enhancement files.
        if config.corpus.corpus_dir.as_os_str().is_empty() {
            errors.push(ValidationError::new(
                "corpus.corpus_dir",
                "Corpus directory cannot be empty",
            ));
        }

        if config.corpus.trees_dir.as_os_str().is_empty() {
            errors.push(ValidationError::new(
                "corpus.trees_dir",
                "Trees directory cannot be empty",
            ));
        }

        if config.corpus.entities_file.as_os_str().is_empty() {
            errors.push(ValidationError::new(
                "corpus.entities_file",
                "Entities file path cannot be empty",
            ));
        }
    }

    fn validate_retrieval(config: &Config, errors: &mut Vec<ValidationError>) {
        let r = &config.retrieval;

        if r.top_k == 0 {
            errors.push(ValidationError::new(
                "retrieval.top_k",
                "top_k must be greater than 0",
            ));
        }

        if r.legacy_top_k == 0 {
            errors.push(ValidationError::new(
                "retrieval.legacy_top_k",
                "legacy_top_k must be greater than 0",
            ));
        }

        if !(0.0..=1.0).contains(&r.legacy_damping) {
            errors.push(ValidationError::new(
                "retrieval.legacy_damping",
                format!("Damping must be within [0, 1], got {}", r.legacy_damping),
            ));
        }

        if !(0.0..=1.0).contains(&r.entity_score_threshold) {
            errors.push(ValidationError::new(
                "retrieval.entity_score_threshold",
                format!(
                    "Threshold must be within [0, 1], got {}",
                    r.entity_score_threshold
                ),
            ));
        }

        if !(0.0..=1.0).contains(&r.dedup_overlap_threshold) {
            errors.push(ValidationError::new(
                "retrieval.dedup_overlap_threshold",
                format!(
                    "Threshold must be within [0, 1], got {}",
                    r.dedup_overlap_threshold
                ),
            ));
        }

        if r.max_compact_tree_chars == 0 {
            errors.push(ValidationError::new(
                "retrieval.max_compact_tree_chars",
                "Compact tree cap must be greater than 0",
            ));
        }

        for (path, weight) in [
            ("retrieval.weights.target_section", r.weights.target_section),
            ("retrieval.weights.mapped_document", r.weights.mapped_document),
            ("retrieval.weights.keyword_match", r.weights.keyword_match),
            ("retrieval.weights.title_bigram", r.weights.title_bigram),
            ("retrieval.weights.title_word", r.weights.title_word),
            ("retrieval.weights.content_bigram", r.weights.content_bigram),
            ("retrieval.weights.content_word", r.weights.content_word),
            ("retrieval.weights.exact_phrase", r.weights.exact_phrase),
        ] {
            if !(0.0..=1.0).contains(&weight) {
                errors.push(ValidationError::new(
                    path,
                    format!("Weight must be within [0, 1], got {}", weight),
                ));
            }
        }
    }

    fn validate_reasoning(config: &Config, errors: &mut Vec<ValidationError>) {
        // Only check the API key when the reasoning strategy is actually on
        if config.reasoning.enabled {
            let env_var = &config.reasoning.api_key_env;
            match std::env::var(env_var) {
                Ok(key) if key.is_empty() => {
                    errors.push(ValidationError::new(
                        "reasoning.api_key_env",
                        format!("Environment variable {} is empty", env_var),
                    ));
                }
                Err(_) => {
                    errors.push(ValidationError::new(
                        "reasoning.api_key_env",
                        format!("Environment variable {} is not set", env_var),
                    ));
                }
                Ok(_) => {}
            }
        }

        if config.reasoning.model.is_empty() {
            errors.push(ValidationError::new(
                "reasoning.model",
                "Model name cannot be empty",
            ));
        }

        if config.reasoning.timeout_secs == 0 {
            errors.push(ValidationError::new(
                "reasoning.timeout_secs",
                "Timeout must be greater than 0",
            ));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_valid_config() {
        let config = Config::default();
        assert!(ConfigValidator::validate(&config).is_ok());
    }

    #[test]
    fn test_empty_corpus_dir() {
        let mut config = Config::default();
        config.corpus.corpus_dir = PathBuf::new();
        assert!(ConfigValidator::validate(&config).is_err());
    }

    #[test]
    fn test_out_of_range_weight() {
        let mut config = Config::default();
        config.retrieval.weights.target_section = 1.5;
        assert!(ConfigValidator::validate(&config).is_err());
    }

    #[test]
    fn test_zero_top_k() {
        let mut config = Config::default();
        config.retrieval.top_k = 0;
        assert!(ConfigValidator::validate(&config).is_err());
    }
}
