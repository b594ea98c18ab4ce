//! Gemini-backed node selector
//!
//! One `generateContent` round trip per retrieval: the compact forest plus the
//! query go in, a JSON array of node references comes back. The request
//! timeout is bounded; expiry surfaces as an ordinary error the caller
//! swallows like any other strategy failure.

use crate::config::ReasoningConfig;
use crate::reasoning::{parse_selection_response, NodeSelection, NodeSelector};
use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const API_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/models";

/// Node selector backed by the Gemini generateContent endpoint.
pub struct GeminiSelector {
    api_key: String,
    model: String,
    client: reqwest::Client,
}

impl GeminiSelector {
    /// Create a selector from configuration, reading the API key from the
    /// configured environment variable.
    pub fn from_config(config: &ReasoningConfig) -> Result<Self> {
        let api_key = std::env::var(&config.api_key_env)
            .with_context(|| format!("Environment variable {} is not set", config.api_key_env))?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            api_key,
            model: config.model.clone(),
            client,
        })
    }

    fn build_prompt(compact_forest: &str, query: &str) -> String {
        format!(
            "You are an information retrieval system. Given the document trees below \
             (titles and summaries only), identify the nodes most relevant to the question.\n\n\
             DOCUMENT TREES:\n{}\n\n\
             QUESTION: \"{}\"\n\n\
             Return a JSON array of at most 3 best-matching nodes:\n\
             [{{\"doc_id\": \"...\", \"node_id\": \"...\", \"relevance\": \"high/medium\"}}]\n\n\
             Return only the JSON array, no other text. \
             If no relevant node exists, return [].",
            compact_forest, query
        )
    }
}

#[derive(Debug, Serialize)]
struct GenerateRequest {
    contents: Vec<RequestContent>,
}

#[derive(Debug, Serialize)]
struct RequestContent {
    parts: Vec<RequestPart>,
}

#[derive(Debug, Serialize)]
struct RequestPart {
    text: String,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: CandidateContent,
}

#[derive(Debug, Default, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: String,
}

#[async_trait]
impl NodeSelector for GeminiSelector {
    async fn select_nodes(&self, compact_forest: &str, query: &str) -> Result<Vec<NodeSelection>> {
        let url = format!("{}/{}:generateContent", API_BASE_URL, self.model);
        let request = GenerateRequest {
            contents: vec![RequestContent {
                parts: vec![RequestPart {
                    text: Self::build_prompt(compact_forest, query),
                }],
            }],
        };

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&request)
            .send()
            .await
            .context("Reasoning request failed")?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            bail!("Reasoning API returned {}: {}", status, body);
        }

        let body: GenerateResponse = response
            .json()
            .await
            .context("Failed to decode reasoning response")?;

        let text = body
            .candidates
            .first()
            .and_then(|c| c.content.parts.first())
            .map(|p| p.text.as_str())
            .unwrap_or_default();
        if text.is_empty() {
            bail!("Reasoning response contained no text");
        }

        parse_selection_response(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_contains_forest_and_query() {
        let prompt = GeminiSelector::build_prompt("{\"doc\": {}}", "nghỉ phép bao nhiêu ngày");
        assert!(prompt.contains("{\"doc\": {}}"));
        assert!(prompt.contains("nghỉ phép bao nhiêu ngày"));
        assert!(prompt.contains("JSON array"));
    }

    #[test]
    fn test_from_config_requires_env_var() {
        let config = ReasoningConfig {
            api_key_env: "POLIDEX_TEST_KEY_THAT_DOES_NOT_EXIST".to_string(),
            ..Default::default()
        };
        assert!(GeminiSelector::from_config(&config).is_err());
    }
}
