use std::sync::Arc;

use crate::core::config::AppConfig;
use crate::llm::LlmService;
use crate::rag::{PineconeStore, VectorStore};

pub mod error;

use error::InitializationError;

/// Services shared by every turn of a session.
///
/// Contains references to:
/// - The loaded configuration
/// - The language model (chat and embeddings)
/// - The vector index
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub llm: LlmService,
    pub store: Arc<dyn VectorStore>,
}

impl AppState {
    pub fn new(config: AppConfig, llm: LlmService, store: Arc<dyn VectorStore>) -> Arc<Self> {
        Arc::new(Self {
            config: Arc::new(config),
            llm,
            store,
        })
    }

    /// Initializes the application state.
    ///
    /// Builds the model client first, then connects to the Pinecone index
    /// with that client as the query embedder. A missing index fails here.
    pub async fn initialize(config: AppConfig) -> Result<Arc<Self>, InitializationError> {
        let llm = LlmService::from_config(&config.llm).map_err(InitializationError::Llm)?;

        let store = PineconeStore::connect(&config.vector_store, llm.clone())
            .await
            .map_err(InitializationError::VectorStore)?;

        tracing::info!(
            "Application state ready (provider={}, chat_model={}, index={})",
            llm.provider_name(),
            llm.chat_model(),
            store.index_name()
        );

        Ok(Self::new(config, llm, Arc::new(store)))
    }
}
