//! TurnContext: Ephemeral context for a single question.
//!
//! Each turn creates a fresh `TurnContext` that flows through the rewrite,
//! retrieval and answer workers. Every stage writes its output here so the
//! session loop (and tests) can inspect what happened.

use uuid::Uuid;

use crate::llm::ChatMessage;
use crate::rag::DocumentChunk;

/// Ephemeral context built for a single conversational turn.
#[derive(Debug, Clone)]
pub struct TurnContext {
    // Identification
    pub turn_id: String,

    // Input
    /// The question exactly as the user asked it.
    pub question: String,
    /// Prior turns, oldest first, already limited to the configured window.
    pub history: Vec<ChatMessage>,

    // Stage outputs
    /// Question after dictionary substitution.
    pub rewritten_question: Option<String>,
    /// History-independent query used for retrieval and answering.
    pub standalone_query: Option<String>,
    pub chunks: Vec<DocumentChunk>,
    pub context_block: String,
    pub answer: Option<String>,
}

impl TurnContext {
    pub fn new(question: impl Into<String>, history: Vec<ChatMessage>) -> Self {
        Self {
            turn_id: Uuid::new_v4().to_string(),
            question: question.into(),
            history,
            rewritten_question: None,
            standalone_query: None,
            chunks: Vec::new(),
            context_block: String::new(),
            answer: None,
        }
    }

    /// The rewritten question, or the original when no rewrite ran.
    pub fn rewritten_or_original(&self) -> &str {
        self.rewritten_question.as_deref().unwrap_or(&self.question)
    }

    /// The query later stages should work with.
    pub fn effective_query(&self) -> &str {
        self.standalone_query
            .as_deref()
            .unwrap_or_else(|| self.rewritten_or_original())
    }

    pub fn has_history(&self) -> bool {
        !self.history.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn effective_query_falls_back_through_stages() {
        let mut ctx = TurnContext::new("원래 질문", vec![]);
        assert_eq!(ctx.effective_query(), "원래 질문");
        assert!(!ctx.has_history());

        ctx.rewritten_question = Some("바뀐 질문".to_string());
        assert_eq!(ctx.effective_query(), "바뀐 질문");

        ctx.standalone_query = Some("독립 질문".to_string());
        assert_eq!(ctx.effective_query(), "독립 질문");
        assert_eq!(ctx.rewritten_or_original(), "바뀐 질문");
    }

    #[test]
    fn each_turn_gets_its_own_id() {
        let a = TurnContext::new("q", vec![]);
        let b = TurnContext::new("q", vec![]);
        assert_ne!(a.turn_id, b.turn_id);
    }
}
