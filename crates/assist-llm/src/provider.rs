//! Language model trait and prompt type.

use assist_core::types::ChatTurn;
use async_trait::async_trait;

use crate::error::LlmError;

/// A fully assembled prompt: optional system instruction, prior turns, and
/// the final user message.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PromptRequest {
    pub system: Option<String>,
    pub history: Vec<ChatTurn>,
    pub user: String,
}

impl PromptRequest {
    pub fn new(user: impl Into<String>) -> Self {
        Self {
            system: None,
            history: Vec::new(),
            user: user.into(),
        }
    }

    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }

    pub fn with_history(mut self, history: &[ChatTurn]) -> Self {
        self.history = history.to_vec();
        self
    }
}

/// Hosted model backend.
///
/// Implementations must return the generated answer as plain text. Any
/// provider-specific response shape is reduced to a string inside the
/// implementation.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Generate a reply for the prompt.
    async fn generate(&self, request: &PromptRequest) -> Result<String, LlmError>;

    /// Name of the underlying model, for logging.
    fn model_name(&self) -> &str;
}
