use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::llm::ChatMessage;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

/// One message of a conversation. Immutable once created.
#[derive(Debug, Clone, Serialize)]
pub struct Turn {
    role: Role,
    text: String,
    created_at: DateTime<Utc>,
}

impl Turn {
    pub fn user(text: impl Into<String>) -> Self {
        Self::new(Role::User, text)
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self::new(Role::Assistant, text)
    }

    fn new(role: Role, text: impl Into<String>) -> Self {
        Self {
            role,
            text: text.into(),
            created_at: Utc::now(),
        }
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn to_chat_message(&self) -> ChatMessage {
        match self.role {
            Role::User => ChatMessage::user(self.text.clone()),
            Role::Assistant => ChatMessage::assistant(self.text.clone()),
        }
    }
}

/// Ordered, in-memory turns of one conversation.
///
/// Only grows. Owned by whoever drives the session loop; nothing here is
/// persisted.
#[derive(Debug, Clone, Serialize)]
pub struct SessionHistory {
    session_id: String,
    turns: Vec<Turn>,
}

impl SessionHistory {
    pub fn new() -> Self {
        Self {
            session_id: Uuid::new_v4().to_string(),
            turns: Vec::new(),
        }
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    /// Append a completed question/answer pair, user turn first.
    pub fn push_exchange(&mut self, question: impl Into<String>, answer: impl Into<String>) {
        self.turns.push(Turn::user(question));
        self.turns.push(Turn::assistant(answer));
    }

    /// The most recent `limit` turns as chat messages, oldest first.
    ///
    /// The window always opens on a user turn, so an odd `limit` yields one
    /// turn less rather than an answer without its question.
    pub fn recent_messages(&self, limit: usize) -> Vec<ChatMessage> {
        let mut start = self.turns.len().saturating_sub(limit);
        if start % 2 == 1 {
            start += 1;
        }
        self.turns[start..]
            .iter()
            .filter(|turn| !turn.text.trim().is_empty())
            .map(Turn::to_chat_message)
            .collect()
    }
}

impl Default for SessionHistory {
    fn default() -> Self {
        Self::new()
    }
}
