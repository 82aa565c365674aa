//! RAG (Retrieval-Augmented Generation) module.
//!
//! This module provides:
//! - `VectorStore`: read-only similarity search over the document index
//! - `PineconeStore`: the Pinecone implementation of `VectorStore`
//! - `RAGContextBuilder`: turns retrieved chunks into one context block

mod context_builder;
mod pinecone;
mod store;

pub use context_builder::{ContextBuilderConfig, RAGContextBuilder};
pub use pinecone::PineconeStore;
pub use store::{DocumentChunk, VectorStore};
