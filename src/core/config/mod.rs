pub mod defaults;
pub mod paths;
pub mod service;
pub mod settings;
pub mod validation;

pub use paths::AppPaths;
pub use service::ConfigService;
pub use settings::{
    AnswerConfig, AppConfig, FewShotExample, LlmConfig, LlmProviderKind, RewriteConfig,
    VectorStoreConfig, MIN_HISTORY_LIMIT,
};
