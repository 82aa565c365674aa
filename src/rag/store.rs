//! VectorStore trait: abstract interface for the document index.
//!
//! The index is populated by an external batch job; this crate only reads
//! from it. The primary implementation is `PineconeStore` in the `pinecone`
//! module.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::core::errors::ApiError;

/// A document chunk returned by a similarity search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentChunk {
    /// Identifier assigned by the index.
    pub id: String,
    /// The text content of the chunk.
    pub text: String,
    /// Remaining metadata stored alongside the vector (source file, headers, …).
    pub metadata: serde_json::Map<String, serde_json::Value>,
    /// Similarity score (higher = better).
    pub score: f32,
}

impl DocumentChunk {
    /// Source identifier, if the indexer stored one.
    pub fn source(&self) -> Option<&str> {
        self.metadata.get("source").and_then(|v| v.as_str())
    }
}

/// Read-only similarity search over an index of pre-embedded chunks.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Name of the index this store queries.
    fn index_name(&self) -> &str;

    /// Top `limit` chunks most similar to `query`, best match first.
    async fn similarity_search(
        &self,
        query: &str,
        limit: usize,
    ) -> Result<Vec<DocumentChunk>, ApiError>;
}
