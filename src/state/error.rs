use thiserror::Error;

use crate::core::errors::ApiError;

#[derive(Debug, Error)]
pub enum InitializationError {
    #[error("Failed to initialize LLM service: {0}")]
    Llm(#[source] ApiError),

    #[error("Failed to connect to vector store: {0}")]
    VectorStore(#[source] ApiError),
}

