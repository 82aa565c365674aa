//! RAG Context Builder.
//!
//! Turns retrieved chunks into the single context block handed to the
//! answer prompt. Chunks keep the order the index returned them in.

use serde::{Deserialize, Serialize};

use super::store::DocumentChunk;
use crate::core::config::AnswerConfig;

/// Configuration for context building.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContextBuilderConfig {
    /// Maximum total context length in characters
    pub max_context_length: usize,
    /// Whether to prefix each chunk with its source
    pub include_citations: bool,
}

impl Default for ContextBuilderConfig {
    fn default() -> Self {
        Self {
            max_context_length: 8000,
            include_citations: false,
        }
    }
}

impl From<&AnswerConfig> for ContextBuilderConfig {
    fn from(config: &AnswerConfig) -> Self {
        Self {
            max_context_length: config.max_context_length,
            include_citations: config.include_citations,
        }
    }
}

pub struct RAGContextBuilder {
    config: ContextBuilderConfig,
}

impl RAGContextBuilder {
    pub fn new(config: ContextBuilderConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ContextBuilderConfig {
        &self.config
    }

    /// Join chunk texts with blank lines.
    ///
    /// A chunk that would push the block past `max_context_length` characters
    /// ends the block; the first chunk is always kept, truncated if needed.
    pub fn build_context(&self, chunks: &[DocumentChunk]) -> String {
        let max_length = self.config.max_context_length;
        let mut parts: Vec<String> = Vec::with_capacity(chunks.len());
        let mut current_length = 0;

        for (i, chunk) in chunks.iter().enumerate() {
            let text = chunk.text.trim();
            if text.is_empty() {
                continue;
            }

            let part = if self.config.include_citations {
                format!(
                    "[{}] (Source: {})\n{}",
                    i + 1,
                    chunk.source().unwrap_or(&chunk.id),
                    text
                )
            } else {
                text.to_string()
            };

            let separator = if parts.is_empty() { 0 } else { 2 };
            let part_length = part.chars().count() + separator;
            if current_length + part_length > max_length {
                if parts.is_empty() {
                    parts.push(part.chars().take(max_length).collect());
                }
                break;
            }

            current_length += part_length;
            parts.push(part);
        }

        parts.join("\n\n")
    }
}
