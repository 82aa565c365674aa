use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("configuration error: {0}")]
    Config(String),
    #[error("{service} error: {message}")]
    Upstream { service: String, message: String },
    #[error("invalid response: {0}")]
    InvalidResponse(String),
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn internal<E: std::fmt::Display>(err: E) -> Self {
        ApiError::Internal(err.to_string())
    }

    pub fn config(message: impl Into<String>) -> Self {
        ApiError::Config(message.into())
    }

    pub fn upstream<E: std::fmt::Display>(service: &str, err: E) -> Self {
        ApiError::Upstream {
            service: service.to_string(),
            message: err.to_string(),
        }
    }

    /// Configuration problems are fatal at startup; everything else fails a
    /// single turn.
    pub fn is_startup_fatal(&self) -> bool {
        matches!(self, ApiError::Config(_))
    }
}
