//! Error types for the conversational core.

use assist_core::error::AssistError;
use assist_llm::LlmError;
use assist_vector::VectorError;

/// Errors raised while producing a reply.
///
/// None of these reach the client as an error status; the orchestrator turns
/// them into reply text.
#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    #[error("message cannot be empty")]
    EmptyMessage,
    #[error("message exceeds maximum length of {0} characters")]
    MessageTooLong(usize),
    #[error("LLM error: {0}")]
    LlmError(String),
    #[error("retrieval error: {0}")]
    RetrievalError(String),
    #[error("tool error: {0}")]
    ToolError(String),
}

impl From<LlmError> for ChatError {
    fn from(err: LlmError) -> Self {
        ChatError::LlmError(err.to_string())
    }
}

impl From<VectorError> for ChatError {
    fn from(err: VectorError) -> Self {
        ChatError::RetrievalError(err.to_string())
    }
}

impl From<AssistError> for ChatError {
    fn from(err: AssistError) -> Self {
        ChatError::ToolError(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chat_error_display() {
        assert_eq!(ChatError::EmptyMessage.to_string(), "message cannot be empty");
        assert_eq!(
            ChatError::MessageTooLong(4000).to_string(),
            "message exceeds maximum length of 4000 characters"
        );
        assert_eq!(
            ChatError::LlmError("model not found".into()).to_string(),
            "LLM error: model not found"
        );
        assert_eq!(
            ChatError::RetrievalError("index corrupt".into()).to_string(),
            "retrieval error: index corrupt"
        );
        assert_eq!(
            ChatError::ToolError("boom".into()).to_string(),
            "tool error: boom"
        );
    }

    #[test]
    fn test_from_llm_error() {
        let err: ChatError = LlmError::EmptyResponse.into();
        assert!(matches!(err, ChatError::LlmError(_)));
        assert!(err.to_string().contains("empty response"));
    }

    #[test]
    fn test_from_vector_error() {
        let err: ChatError = VectorError::Embedding("quota".into()).into();
        assert!(matches!(err, ChatError::RetrievalError(_)));
        assert!(err.to_string().contains("quota"));
    }

    #[test]
    fn test_from_assist_error() {
        let err: ChatError = AssistError::Tool("gmail down".into()).into();
        assert!(matches!(err, ChatError::ToolError(_)));
    }

    #[test]
    fn test_unicode_inner_messages() {
        let err = ChatError::LlmError("할당량 초과".into());
        assert!(err.to_string().contains("할당량 초과"));
    }
}
