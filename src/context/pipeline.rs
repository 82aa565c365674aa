use std::sync::Arc;

use super::pipeline_context::TurnContext;
use super::worker::WorkerPipeline;
use super::workers::{AnswerWorker, RetrievalWorker, RewriteWorker};
use crate::core::config::AppConfig;
use crate::core::errors::ApiError;
use crate::llm::ChatMessage;
use crate::state::AppState;

pub struct ContextPipeline;

impl ContextPipeline {
    /// Rewrite, then history-aware retrieval, then answer.
    pub fn standard(config: &AppConfig) -> Result<WorkerPipeline, ApiError> {
        Ok(WorkerPipeline::new()
            .add_worker(Box::new(RewriteWorker::from_config(&config.rewrite)?))
            .add_worker(Box::new(RetrievalWorker::new(config.vector_store.top_k)))
            .add_worker(Box::new(AnswerWorker::from_config(&config.answer))))
    }

    /// Run one question through `pipeline` and return the filled context.
    pub async fn run_turn(
        pipeline: &WorkerPipeline,
        state: &Arc<AppState>,
        history: Vec<ChatMessage>,
        question: &str,
    ) -> Result<TurnContext, ApiError> {
        let mut ctx = TurnContext::new(question, history);
        tracing::info!(
            "[{}] Turn started ({} prior message(s))",
            ctx.turn_id,
            ctx.history.len()
        );

        pipeline
            .run(&mut ctx, state)
            .await
            .map_err(|e| e.into_api_error())?;

        if ctx.answer.is_none() {
            return Err(ApiError::Internal(format!(
                "turn {} finished without an answer",
                ctx.turn_id
            )));
        }
        Ok(ctx)
    }
}
