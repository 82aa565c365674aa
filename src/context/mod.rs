//! Per-turn answering pipeline.
//!
//! A question becomes a [`TurnContext`] that flows through the rewrite,
//! retrieval and answer workers in that order.

pub mod pipeline;
pub mod pipeline_context;
pub mod prompt;
pub mod rewriter;
pub mod worker;
pub mod workers;

#[cfg(test)]
pub(crate) mod test_support;

pub use pipeline::ContextPipeline;
pub use pipeline_context::TurnContext;
pub use prompt::NOT_DETERMINABLE;
pub use rewriter::QueryRewriter;
pub use worker::{ContextWorker, WorkerError, WorkerPipeline};
