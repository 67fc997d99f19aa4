//! Error types for the savings advisor pipeline

use thiserror::Error;

/// Result type alias for pipeline operations
pub type Result<T> = std::result::Result<T, AdvisorError>;

#[derive(Error, Debug)]
pub enum AdvisorError {

    // =============================
    // Core Pipeline Errors
    // =============================

    #[error("LLM error: {0}")]
    Llm(String),

    #[error("Tool error: {0}")]
    Tool(String),

    #[error("Tool not found: {0}")]
    ToolNotFound(String),

    #[error("Invalid tool input: {0}")]
    InvalidToolInput(String),

    #[error("Prompt error: {0}")]
    Prompt(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Confirmation error: {0}")]
    Confirmation(String),

    #[error("Max steps exceeded: {0}")]
    MaxStepsExceeded(String),

    // =============================
    // External Library Conversions
    // =============================

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl AdvisorError {
    /// Whether retrying the same call could plausibly succeed.
    ///
    /// Bad arguments and unknown tools fail the same way every time.
    pub fn is_transient(&self) -> bool {
        !matches!(
            self,
            AdvisorError::InvalidToolInput(_)
                | AdvisorError::ToolNotFound(_)
                | AdvisorError::Config(_)
                | AdvisorError::Prompt(_)
        )
    }
}
