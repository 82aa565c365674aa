use std::sync::Arc;
use std::time::Duration;

use crate::core::config::{LlmConfig, LlmProviderKind};
use crate::core::errors::ApiError;
use crate::llm::ollama::OllamaProvider;
use crate::llm::openai_compat::OpenAiCompatProvider;
use crate::llm::provider::LlmProvider;
use crate::llm::types::{ChatMessage, ChatRequest};

/// Chat and embedding calls bound to the configured models.
#[derive(Clone)]
pub struct LlmService {
    provider: Arc<dyn LlmProvider>,
    config: LlmConfig,
}

impl LlmService {
    pub fn new(provider: Arc<dyn LlmProvider>, config: LlmConfig) -> Self {
        Self { provider, config }
    }

    pub fn from_config(config: &LlmConfig) -> Result<Self, ApiError> {
        let timeout = Duration::from_secs(config.timeout_secs);
        let provider: Arc<dyn LlmProvider> = match config.provider {
            LlmProviderKind::Ollama => {
                Arc::new(OllamaProvider::new(config.base_url.clone(), timeout)?)
            }
            LlmProviderKind::OpenaiCompatible => Arc::new(OpenAiCompatProvider::new(
                config.base_url.clone(),
                config.api_key.clone(),
                timeout,
            )?),
        };
        Ok(Self::new(provider, config.clone()))
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    pub fn chat_model(&self) -> &str {
        &self.config.chat_model
    }

    pub async fn health_check(&self) -> Result<bool, ApiError> {
        self.provider.health_check().await
    }

    pub async fn chat(&self, messages: Vec<ChatMessage>) -> Result<String, ApiError> {
        let request = ChatRequest::new(messages).with_config(&self.config);
        tracing::debug!(
            "LLM chat: provider={} model={} messages={}",
            self.provider.name(),
            self.config.chat_model,
            request.messages.len()
        );
        self.provider.chat(request, &self.config.chat_model).await
    }

    pub async fn embed(&self, inputs: &[String]) -> Result<Vec<Vec<f32>>, ApiError> {
        self.provider
            .embed(inputs, &self.config.embedding_model)
            .await
    }

    pub async fn embed_query(&self, text: &str) -> Result<Vec<f32>, ApiError> {
        let mut vectors = self.embed(&[text.to_string()]).await?;
        vectors
            .pop()
            .ok_or_else(|| ApiError::InvalidResponse("embedding response was empty".to_string()))
    }
}
