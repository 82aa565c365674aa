pub mod ollama;
pub mod openai_compat;
pub mod provider;
pub mod service;
pub mod types;

pub use provider::LlmProvider;
pub use service::LlmService;
pub use types::{ChatMessage, ChatRequest};
