//! Error types for the language model client.

use assist_core::error::AssistError;

/// Errors from a language model call.
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("API key is not configured")]
    MissingApiKey,
    #[error("request failed: {0}")]
    Http(String),
    #[error("API returned {status}: {message}")]
    Api { status: u16, message: String },
    #[error("prompt was blocked: {0}")]
    Blocked(String),
    #[error("model returned an empty response")]
    EmptyResponse,
}

impl From<reqwest::Error> for LlmError {
    fn from(err: reqwest::Error) -> Self {
        LlmError::Http(err.to_string())
    }
}

impl From<LlmError> for AssistError {
    fn from(err: LlmError) -> Self {
        AssistError::Llm(err.to_string())
    }
}
