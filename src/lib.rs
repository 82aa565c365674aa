//! Conversational assistant for Korean income-tax law, answering from a
//! Pinecone index of the statute.

pub mod context;
pub mod core;
pub mod history;
pub mod llm;
pub mod rag;
pub mod session;
pub mod state;
