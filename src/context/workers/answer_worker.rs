//! AnswerWorker: Composes the grounded prompt and asks the model.
//!
//! Retrieved chunks become one context block. An empty block means nothing
//! in the index can support an answer, so the fixed "not determinable"
//! sentence is returned without a model call.

use std::sync::Arc;

use async_trait::async_trait;

use crate::context::pipeline_context::TurnContext;
use crate::context::prompt::{answer_messages, NOT_DETERMINABLE};
use crate::context::worker::{ContextWorker, WorkerError};
use crate::core::config::{AnswerConfig, FewShotExample};
use crate::core::errors::ApiError;
use crate::rag::RAGContextBuilder;
use crate::state::AppState;

pub struct AnswerWorker {
    builder: RAGContextBuilder,
    few_shot: Vec<FewShotExample>,
}

impl AnswerWorker {
    pub fn new(builder: RAGContextBuilder, few_shot: Vec<FewShotExample>) -> Self {
        Self { builder, few_shot }
    }

    pub fn from_config(config: &AnswerConfig) -> Self {
        Self::new(RAGContextBuilder::new(config.into()), config.few_shot.clone())
    }
}

#[async_trait]
impl ContextWorker for AnswerWorker {
    fn name(&self) -> &str {
        "answer"
    }

    async fn execute(
        &self,
        ctx: &mut TurnContext,
        state: &Arc<AppState>,
    ) -> Result<(), WorkerError> {
        ctx.context_block = self.builder.build_context(&ctx.chunks);

        if ctx.context_block.trim().is_empty() {
            tracing::info!("[{}] No usable context, answering not determinable", ctx.turn_id);
            ctx.answer = Some(NOT_DETERMINABLE.to_string());
            return Ok(());
        }

        let messages = answer_messages(
            &ctx.context_block,
            &self.few_shot,
            &ctx.history,
            ctx.effective_query(),
        );

        let answer = state
            .llm
            .chat(messages)
            .await
            .map_err(|e| WorkerError::failed("answer", e))?;

        let answer = answer.trim();
        if answer.is_empty() {
            return Err(WorkerError::failed(
                "answer",
                ApiError::InvalidResponse("model returned an empty answer".to_string()),
            ));
        }

        ctx.answer = Some(answer.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::test_support::{chunk, fixture};
    use crate::llm::ChatMessage;

    fn worker() -> AnswerWorker {
        AnswerWorker::from_config(&AnswerConfig::default())
    }

    #[tokio::test]
    async fn empty_context_returns_fallback_without_model_call() {
        let fx = fixture(vec![], vec![]);
        let mut ctx = TurnContext::new("양도소득세 세율은?", vec![]);

        worker().execute(&mut ctx, &fx.state).await.unwrap();

        assert_eq!(ctx.answer.as_deref(), Some(NOT_DETERMINABLE));
        assert!(fx.llm.requests().is_empty());
    }

    #[tokio::test]
    async fn blank_chunks_count_as_no_context() {
        let fx = fixture(vec![], vec![]);
        let mut ctx = TurnContext::new("세율은?", vec![]);
        ctx.chunks = vec![chunk("c1", "   ")];

        worker().execute(&mut ctx, &fx.state).await.unwrap();

        assert_eq!(ctx.answer.as_deref(), Some(NOT_DETERMINABLE));
    }

    #[tokio::test]
    async fn prompt_carries_context_examples_history_and_question() {
        let fx = fixture(vec!["  세율은 24%입니다.  "], vec![]);
        let history = vec![ChatMessage::user("이전 질문"), ChatMessage::assistant("이전 답변")];
        let mut ctx = TurnContext::new("그 경우 세율은?", history);
        ctx.standalone_query = Some("거주자가 5천만원 초과일 때 세율은?".to_string());
        ctx.chunks = vec![
            chunk("c1", "5천만원 초과 8천8백만원 이하: 624만원 + 초과금액의 24%"),
            chunk("c2", "제55조 세율"),
        ];

        worker().execute(&mut ctx, &fx.state).await.unwrap();

        assert_eq!(ctx.answer.as_deref(), Some("세율은 24%입니다."));
        assert_eq!(
            ctx.context_block,
            "5천만원 초과 8천8백만원 이하: 624만원 + 초과금액의 24%\n\n제55조 세율"
        );

        let requests = fx.llm.requests();
        assert_eq!(requests.len(), 1);
        let messages = &requests[0];
        let examples = AnswerConfig::default().few_shot.len();
        assert_eq!(messages.len(), 1 + examples * 2 + 2 + 1);
        assert!(messages[0].content.contains(&ctx.context_block));
        assert_eq!(messages[1 + examples * 2].content, "이전 질문");
        assert_eq!(
            messages.last(),
            Some(&ChatMessage::user("거주자가 5천만원 초과일 때 세율은?"))
        );
    }

    #[tokio::test]
    async fn empty_model_answer_is_invalid_response() {
        let fx = fixture(vec![""], vec![]);
        let mut ctx = TurnContext::new("세율은?", vec![]);
        ctx.chunks = vec![chunk("c1", "제55조 세율")];

        let err = worker().execute(&mut ctx, &fx.state).await.unwrap_err();

        assert!(matches!(err.into_api_error(), ApiError::InvalidResponse(_)));
        assert!(ctx.answer.is_none());
    }
}
