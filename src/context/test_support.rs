//! Scripted model and recording index shared by pipeline tests.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::Map;

use crate::core::config::AppConfig;
use crate::core::errors::ApiError;
use crate::llm::{ChatMessage, ChatRequest, LlmProvider, LlmService};
use crate::rag::{DocumentChunk, VectorStore};
use crate::state::AppState;

/// Answers chat calls from a queue; an exhausted queue is an upstream error.
#[derive(Default)]
pub struct ScriptedLlm {
    replies: Mutex<VecDeque<String>>,
    pub requests: Mutex<Vec<Vec<ChatMessage>>>,
}

impl ScriptedLlm {
    pub fn new(replies: Vec<&str>) -> Self {
        Self {
            replies: Mutex::new(replies.into_iter().map(str::to_string).collect()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn requests(&self) -> Vec<Vec<ChatMessage>> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl LlmProvider for ScriptedLlm {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn health_check(&self) -> Result<bool, ApiError> {
        Ok(true)
    }


    async fn chat(&self, request: ChatRequest, _model_id: &str) -> Result<String, ApiError> {
        self.requests.lock().unwrap().push(request.messages);
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| ApiError::upstream("scripted", "no reply left"))
    }

    async fn embed(&self, inputs: &[String], _model_id: &str) -> Result<Vec<Vec<f32>>, ApiError> {
        Ok(inputs.iter().map(|_| vec![1.0, 0.0]).collect())
    }
}

/// Returns fixed chunks and records every query.
pub struct RecordingStore {
    chunks: Vec<DocumentChunk>,
    fail: bool,
    pub queries: Mutex<Vec<(String, usize)>>,
}

impl RecordingStore {
    pub fn new(chunks: Vec<DocumentChunk>) -> Self {
        Self {
            chunks,
            fail: false,
            queries: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::new(vec![])
        }
    }

    pub fn queries(&self) -> Vec<(String, usize)> {
        self.queries.lock().unwrap().clone()
    }
}

#[async_trait]
impl VectorStore for RecordingStore {
    fn index_name(&self) -> &str {
        "test-index"
    }

    async fn similarity_search(
        &self,
        query: &str,
        limit: usize,
    ) -> Result<Vec<DocumentChunk>, ApiError> {
        self.queries.lock().unwrap().push((query.to_string(), limit));
        if self.fail {
            return Err(ApiError::upstream("pinecone", "503 Service Unavailable"));
        }
        Ok(self.chunks.iter().take(limit).cloned().collect())
    }
}

pub struct Fixture {
    pub state: Arc<AppState>,
    pub llm: Arc<ScriptedLlm>,
    pub store: Arc<RecordingStore>,
}

pub fn fixture_with(config: AppConfig, llm: ScriptedLlm, store: RecordingStore) -> Fixture {
    let llm = Arc::new(llm);
    let store = Arc::new(store);
    let service = LlmService::new(llm.clone(), config.llm.clone());
    let state = AppState::new(config, service, store.clone());
    Fixture { state, llm, store }
}

pub fn fixture(replies: Vec<&str>, chunks: Vec<DocumentChunk>) -> Fixture {
    fixture_with(
        AppConfig::default(),
        ScriptedLlm::new(replies),
        RecordingStore::new(chunks),
    )
}

pub fn fake_state(replies: Vec<&str>, chunks: Vec<DocumentChunk>) -> Arc<AppState> {
    fixture(replies, chunks).state
}

pub fn chunk(id: &str, text: &str) -> DocumentChunk {
    DocumentChunk {
        id: id.to_string(),
        text: text.to_string(),
        metadata: Map::new(),
        score: 0.9,
    }
}
