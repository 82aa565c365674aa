//! The question/answer loop for one conversation.

use std::sync::Arc;

use serde::Serialize;

use crate::context::{ContextPipeline, WorkerPipeline};
use crate::core::config::validation::validate_history_limit;
use crate::core::errors::ApiError;
use crate::history::SessionHistory;
use crate::rag::DocumentChunk;
use crate::state::AppState;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Idle,
    Answering,
}

/// What a completed turn produced, besides the answer itself.
#[derive(Debug, Clone)]
pub struct TurnOutcome {
    pub turn_id: String,
    pub answer: String,
    pub rewritten_question: String,
    pub standalone_query: String,
    pub chunks: Vec<DocumentChunk>,
}

pub struct SessionLoop {
    state: Arc<AppState>,
    pipeline: WorkerPipeline,
    status: SessionStatus,
}

impl SessionLoop {
    pub fn new(state: Arc<AppState>) -> Result<Self, ApiError> {
        let pipeline = ContextPipeline::standard(&state.config)?;
        Self::with_pipeline(state, pipeline)
    }

    pub fn with_pipeline(
        state: Arc<AppState>,
        pipeline: WorkerPipeline,
    ) -> Result<Self, ApiError> {
        validate_history_limit(state.config.answer.history_limit)?;
        Ok(Self {
            state,
            pipeline,
            status: SessionStatus::Idle,
        })
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    /// Answer one question.
    ///
    /// On success the question and answer are appended to `history`, user
    /// turn first. On failure `history` is left as it was. Either way the
    /// loop is idle again when this returns.
    pub async fn ask(
        &mut self,
        history: &mut SessionHistory,
        question: &str,
    ) -> Result<TurnOutcome, ApiError> {
        let question = question.trim();
        if question.is_empty() {
            return Err(ApiError::BadRequest("question is empty".to_string()));
        }

        self.status = SessionStatus::Answering;
        let recent = history.recent_messages(self.state.config.answer.history_limit);
        let result =
            ContextPipeline::run_turn(&self.pipeline, &self.state, recent, question).await;
        self.status = SessionStatus::Idle;

        let ctx = match result {
            Ok(ctx) => ctx,
            Err(e) => {
                tracing::error!("Session {}: turn failed: {}", history.session_id(), e);
                return Err(e);
            }
        };

        let answer = ctx
            .answer
            .clone()
            .ok_or_else(|| ApiError::Internal("turn finished without an answer".to_string()))?;
        history.push_exchange(question, answer.clone());

        tracing::info!(
            "Session {}: turn {} answered ({} turns in history)",
            history.session_id(),
            ctx.turn_id,
            history.len()
        );

        Ok(TurnOutcome {
            rewritten_question: ctx.rewritten_or_original().to_string(),
            standalone_query: ctx.effective_query().to_string(),
            turn_id: ctx.turn_id,
            answer,
            chunks: ctx.chunks,
        })
    }
}
