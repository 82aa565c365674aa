//! ContextWorker trait and WorkerPipeline execution engine.
//!
//! Each stage of a turn (rewrite, retrieval, answer) is a worker that
//! enriches the `TurnContext` in place. `WorkerPipeline` runs them in order
//! and stops at the first failure; a failed call is never retried.

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use super::pipeline_context::TurnContext;
use crate::core::errors::ApiError;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// WorkerError
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("Worker '{name}' failed: {source}")]
    ExecutionFailed {
        name: String,
        #[source]
        source: ApiError,
    },

    #[error("Worker '{name}' skipped: {reason}")]
    Skipped { name: String, reason: String },
}

impl WorkerError {
    pub fn failed(name: impl Into<String>, source: ApiError) -> Self {
        Self::ExecutionFailed {
            name: name.into(),
            source,
        }
    }

    pub fn skipped(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Skipped {
            name: name.into(),
            reason: reason.into(),
        }
    }

    /// Whether this error is a skip (non-fatal).
    pub fn is_skip(&self) -> bool {
        matches!(self, Self::Skipped { .. })
    }

    /// The underlying error for callers outside the pipeline.
    pub fn into_api_error(self) -> ApiError {
        match self {
            Self::ExecutionFailed { source, .. } => source,
            skipped @ Self::Skipped { .. } => ApiError::internal(skipped),
        }
    }
}

// ---------------------------------------------------------------------------
// ContextWorker Trait
// ---------------------------------------------------------------------------

/// A single stage of answering a question.
#[async_trait]
pub trait ContextWorker: Send + Sync {
    /// Unique name for logging / diagnostics.
    fn name(&self) -> &str;

    /// Execute this worker, enriching `ctx`.
    async fn execute(&self, ctx: &mut TurnContext, state: &Arc<AppState>)
        -> Result<(), WorkerError>;
}

// ---------------------------------------------------------------------------
// WorkerPipeline
// ---------------------------------------------------------------------------

/// Chains multiple `ContextWorker`s and executes them sequentially.
pub struct WorkerPipeline {
    workers: Vec<Box<dyn ContextWorker>>,
}

impl WorkerPipeline {
    pub fn new() -> Self {
        Self {
            workers: Vec::new(),
        }
    }

    /// Add a worker to the end of the pipeline.
    pub fn add_worker(mut self, worker: Box<dyn ContextWorker>) -> Self {
        self.workers.push(worker);
        self
    }

    /// Execute all workers in order.
    ///
    /// - **Skipped** errors are logged and the next worker runs.
    /// - Any other error aborts the pipeline immediately.
    pub async fn run(
        &self,
        ctx: &mut TurnContext,
        state: &Arc<AppState>,
    ) -> Result<(), WorkerError> {
        for worker in &self.workers {
            match worker.execute(ctx, state).await {
                Ok(()) => {
                    tracing::debug!("Worker '{}' completed", worker.name());
                }
                Err(e) if e.is_skip() => {
                    tracing::info!("Worker '{}' skipped: {}", worker.name(), e);
                }
                Err(e) => {
                    tracing::error!("Worker '{}' failed: {}", worker.name(), e);
                    return Err(e);
                }
            }
        }

        Ok(())
    }

    pub fn worker_names(&self) -> Vec<&str> {
        self.workers.iter().map(|w| w.name()).collect()
    }

    /// Number of workers in the pipeline.
    pub fn len(&self) -> usize {
        self.workers.len()
    }

    /// Whether the pipeline has no workers.
    pub fn is_empty(&self) -> bool {
        self.workers.is_empty()
    }
}

impl Default for WorkerPipeline {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
