//! Worker modules, one per stage of a turn.

pub mod answer_worker;
pub mod retrieval_worker;
pub mod rewrite_worker;

pub use answer_worker::AnswerWorker;
pub use retrieval_worker::RetrievalWorker;
pub use rewrite_worker::RewriteWorker;
