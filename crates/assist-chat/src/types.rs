//! Wire types for the chat endpoint.

use assist_core::types::ConversationHistory;
use serde::{Deserialize, Serialize};

/// Request body for `POST /api/chat`.
///
/// `history` holds completed exchanges as `[user_text, assistant_text]`
/// pairs, oldest first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatRequest {
    pub message: String,
    #[serde(default)]
    pub history: Vec<(String, String)>,
}

impl ChatRequest {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            history: Vec::new(),
        }
    }

    pub fn conversation(&self) -> ConversationHistory {
        ConversationHistory::from_pairs(self.history.iter().cloned())
    }
}

/// Response body for `POST /api/chat`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatResponse {
    pub response: String,
}
