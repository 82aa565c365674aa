//! Typed application configuration.
//!
//! Everything the pipeline needs is carried in [`AppConfig`], built once at
//! startup by [`super::ConfigService`] and passed to constructors explicitly.

use serde::{Deserialize, Serialize};

use super::defaults::{default_dictionary, default_few_shot_examples};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub llm: LlmConfig,
    pub vector_store: VectorStoreConfig,
    pub rewrite: RewriteConfig,
    pub answer: AnswerConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LlmProviderKind {
    Ollama,
    OpenaiCompatible,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    pub provider: LlmProviderKind,
    pub base_url: String,
    pub chat_model: String,
    pub embedding_model: String,
    /// Only sent by the OpenAI-compatible provider.
    pub api_key: Option<String>,
    pub temperature: Option<f64>,
    pub max_tokens: Option<i32>,
    pub timeout_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: LlmProviderKind::Ollama,
            base_url: "http://localhost:11434".to_string(),
            chat_model: "llama3.2".to_string(),
            embedding_model: "nomic-embed-text".to_string(),
            api_key: None,
            temperature: None,
            max_tokens: None,
            timeout_secs: 120,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VectorStoreConfig {
    pub api_key: Option<String>,
    pub index_name: String,
    /// Data-plane host of the index. Resolved through the control plane when unset.
    pub index_host: Option<String>,
    pub control_plane_url: String,
    pub namespace: Option<String>,
    pub top_k: usize,
    /// Metadata key under which the chunk text was stored at indexing time.
    pub text_key: String,
    pub timeout_secs: u64,
}

impl Default for VectorStoreConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            index_name: "tax-markdown-index".to_string(),
            index_host: None,
            control_plane_url: "https://api.pinecone.io".to_string(),
            namespace: None,
            top_k: 4,
            text_key: "text".to_string(),
            timeout_secs: 30,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RewriteConfig {
    /// Substitution rules written as `"<phrase> -> <term>"`.
    pub dictionary: Vec<String>,
    /// Also ask the model to apply the dictionary.
    pub llm_pass: bool,
}

impl Default for RewriteConfig {
    fn default() -> Self {
        Self {
            dictionary: default_dictionary(),
            llm_pass: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FewShotExample {
    pub question: String,
    pub answer: String,
}

/// Smallest history window that still holds one question and its answer.
pub const MIN_HISTORY_LIMIT: usize = 2;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnswerConfig {
    pub few_shot: Vec<FewShotExample>,
    /// Number of most recent turns forwarded to the model. At least
    /// `MIN_HISTORY_LIMIT`; an odd value is rounded down to whole exchanges.
    pub history_limit: usize,
    pub max_context_length: usize,
    pub include_citations: bool,
}

impl Default for AnswerConfig {
    fn default() -> Self {
        Self {
            few_shot: default_few_shot_examples(),
            history_limit: 20,
            max_context_length: 8000,
            include_citations: false,
        }
    }
}
