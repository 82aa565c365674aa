//! RewriteWorker: Maps everyday phrases to the index's legal vocabulary.
//!
//! The deterministic dictionary rewrite always runs. With `llm_pass`
//! enabled the dictionary prompt is also sent to the model, and its output
//! replaces the deterministic rewrite only when it passes
//! `QueryRewriter::accept_model_rewrite`.

use std::sync::Arc;

use async_trait::async_trait;

use crate::context::pipeline_context::TurnContext;
use crate::context::prompt::dictionary_messages;
use crate::context::rewriter::QueryRewriter;
use crate::context::worker::{ContextWorker, WorkerError};
use crate::core::config::RewriteConfig;
use crate::core::errors::ApiError;
use crate::state::AppState;

pub struct RewriteWorker {
    rewriter: QueryRewriter,
    llm_pass: bool,
}

impl RewriteWorker {
    pub fn new(rewriter: QueryRewriter, llm_pass: bool) -> Self {
        Self { rewriter, llm_pass }
    }

    pub fn from_config(config: &RewriteConfig) -> Result<Self, ApiError> {
        Ok(Self::new(QueryRewriter::from_config(config)?, config.llm_pass))
    }
}

#[async_trait]
impl ContextWorker for RewriteWorker {
    fn name(&self) -> &str {
        "rewrite"
    }

    async fn execute(
        &self,
        ctx: &mut TurnContext,
        state: &Arc<AppState>,
    ) -> Result<(), WorkerError> {
        if self.rewriter.is_empty() {
            return Err(WorkerError::skipped("rewrite", "no dictionary rules configured"));
        }

        let deterministic = self.rewriter.rewrite(&ctx.question);

        let rewritten = if self.llm_pass {
            let output = state
                .llm
                .chat(dictionary_messages(self.rewriter.rules(), &ctx.question))
                .await
                .map_err(|e| WorkerError::failed("rewrite", e))?;

            match self.rewriter.accept_model_rewrite(&deterministic, &output) {
                Some(candidate) => candidate,
                None => {
                    tracing::warn!(
                        "[{}] Model rewrite rejected, keeping dictionary rewrite: {:?}",
                        ctx.turn_id,
                        output
                    );
                    deterministic
                }
            }
        } else {
            deterministic
        };

        tracing::info!("[{}] Rewritten query: {}", ctx.turn_id, rewritten);
        ctx.rewritten_question = Some(rewritten);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::test_support::fixture;

    const QUESTION: &str = "사람을 나타내는 표현이 5천만원 초과일 때 세율은?";

    fn worker(llm_pass: bool) -> RewriteWorker {
        RewriteWorker::from_config(&RewriteConfig {
            llm_pass,
            ..Default::default()
        })
        .unwrap()
    }

    #[tokio::test]
    async fn dictionary_rewrite_without_model_call() {
        let fx = fixture(vec![], vec![]);
        let mut ctx = TurnContext::new(QUESTION, vec![]);

        worker(false).execute(&mut ctx, &fx.state).await.unwrap();

        let rewritten = ctx.rewritten_question.unwrap();
        assert!(rewritten.contains("거주자"));
        assert!(rewritten.contains("5천만원"));
        assert!(!rewritten.contains("사람을 나타내는 표현"));
        assert!(fx.llm.requests().is_empty());
    }

    #[tokio::test]
    async fn accepted_model_rewrite_is_used() {
        let fx = fixture(vec!["거주자의 소득이 5천만원 초과일 때 세율은?"], vec![]);
        let mut ctx = TurnContext::new(QUESTION, vec![]);

        worker(true).execute(&mut ctx, &fx.state).await.unwrap();

        assert_eq!(
            ctx.rewritten_question.as_deref(),
            Some("거주자의 소득이 5천만원 초과일 때 세율은?")
        );
        let requests = fx.llm.requests();
        assert_eq!(requests.len(), 1);
        assert!(requests[0][0].content.contains(QUESTION));
    }

    #[tokio::test]
    async fn model_rewrite_that_drops_amount_falls_back() {
        let fx = fixture(vec!["거주자의 세율은?"], vec![]);
        let mut ctx = TurnContext::new(QUESTION, vec![]);

        worker(true).execute(&mut ctx, &fx.state).await.unwrap();

        assert_eq!(
            ctx.rewritten_question.as_deref(),
            Some("거주자가 5천만원 초과일 때 세율은?")
        );
    }

    #[tokio::test]
    async fn model_failure_fails_the_worker() {
        let fx = fixture(vec![], vec![]);
        let mut ctx = TurnContext::new(QUESTION, vec![]);

        let err = worker(true).execute(&mut ctx, &fx.state).await.unwrap_err();
        assert!(!err.is_skip());
        assert!(ctx.rewritten_question.is_none());
    }

    #[tokio::test]
    async fn empty_dictionary_skips() {
        let fx = fixture(vec![], vec![]);
        let mut ctx = TurnContext::new(QUESTION, vec![]);
        let worker = RewriteWorker::from_config(&RewriteConfig {
            dictionary: vec![],
            llm_pass: false,
        })
        .unwrap();

        let err = worker.execute(&mut ctx, &fx.state).await.unwrap_err();
        assert!(err.is_skip());
        assert_eq!(ctx.rewritten_or_original(), QUESTION);
    }
}
