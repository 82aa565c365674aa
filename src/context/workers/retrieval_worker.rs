//! RetrievalWorker: History-aware retrieval from the vector index.
//!
//! With no prior turns the (rewritten) question goes to the index as is.
//! Otherwise the model first restates it as a standalone question using the
//! history, so the index never sees a bare follow-up like "그 경우는?".

use std::sync::Arc;

use async_trait::async_trait;

use crate::context::pipeline_context::TurnContext;
use crate::context::prompt::contextualize_messages;
use crate::context::worker::{ContextWorker, WorkerError};
use crate::state::AppState;

pub struct RetrievalWorker {
    /// Number of chunks to retrieve.
    top_k: usize,
}

impl RetrievalWorker {
    pub fn new(top_k: usize) -> Self {
        Self { top_k }
    }

    async fn standalone_query(
        &self,
        ctx: &TurnContext,
        state: &Arc<AppState>,
    ) -> Result<String, WorkerError> {
        let question = ctx.rewritten_or_original();
        if !ctx.has_history() {
            return Ok(question.to_string());
        }

        let output = state
            .llm
            .chat(contextualize_messages(&ctx.history, question))
            .await
            .map_err(|e| WorkerError::failed("retrieval", e))?;

        let output = output.trim();
        if output.is_empty() {
            tracing::warn!(
                "[{}] Empty reformulation, querying with the question itself",
                ctx.turn_id
            );
            return Ok(question.to_string());
        }
        Ok(output.to_string())
    }
}

impl Default for RetrievalWorker {
    fn default() -> Self {
        Self::new(4)
    }
}

#[async_trait]
impl ContextWorker for RetrievalWorker {
    fn name(&self) -> &str {
        "retrieval"
    }

    async fn execute(
        &self,
        ctx: &mut TurnContext,
        state: &Arc<AppState>,
    ) -> Result<(), WorkerError> {
        let query = self.standalone_query(ctx, state).await?;
        tracing::info!("[{}] Standalone query: {}", ctx.turn_id, query);

        let chunks = state
            .store
            .similarity_search(&query, self.top_k)
            .await
            .map_err(|e| WorkerError::failed("retrieval", e))?;

        tracing::info!(
            "[{}] Retrieved {} chunk(s) from '{}'",
            ctx.turn_id,
            chunks.len(),
            state.store.index_name()
        );

        ctx.standalone_query = Some(query);
        ctx.chunks = chunks;
        Ok(())
    }
}
