use std::fmt;

use serde::{Deserialize, Serialize};

// =============================================================================
// Conversation
// =============================================================================

/// Speaker of a conversation turn.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Assistant,
}

/// One message in a conversation. Immutable once created.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: Role,
    pub text: String,
}

impl ChatTurn {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            text: text.into(),
        }
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            text: text.into(),
        }
    }
}

/// Ordered record of prior turns, oldest first.
///
/// The transport carries history as `(user_text, assistant_text)` pairs, one
/// per completed exchange; internally it is a flat turn sequence.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationHistory {
    turns: Vec<ChatTurn>,
}

impl ConversationHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a history from completed exchanges, preserving their order.
    pub fn from_pairs<I, U, A>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (U, A)>,
        U: Into<String>,
        A: Into<String>,
    {
        let turns = pairs
            .into_iter()
            .flat_map(|(user, assistant)| [ChatTurn::user(user), ChatTurn::assistant(assistant)])
            .collect();
        Self { turns }
    }

    /// Return a new history with one more completed exchange appended.
    pub fn with_exchange(&self, user: impl Into<String>, assistant: impl Into<String>) -> Self {
        let mut turns = self.turns.clone();
        turns.push(ChatTurn::user(user));
        turns.push(ChatTurn::assistant(assistant));
        Self { turns }
    }

    /// Convert back to the transport representation.
    ///
    /// A trailing user turn with no answer is not a completed exchange and is
    /// omitted.
    pub fn to_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = Vec::with_capacity(self.turns.len() / 2);
        let mut pending_user: Option<&str> = None;
        for turn in &self.turns {
            match turn.role {
                Role::User => pending_user = Some(&turn.text),
                Role::Assistant => {
                    if let Some(user) = pending_user.take() {
                        pairs.push((user.to_string(), turn.text.clone()));
                    }
                }
            }
        }
        pairs
    }

    pub fn turns(&self) -> &[ChatTurn] {
        &self.turns
    }

    /// Number of completed exchanges.
    pub fn exchange_count(&self) -> usize {
        self.to_pairs().len()
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }
}

// =============================================================================
// Routing
// =============================================================================

/// Which response pipeline handles a message.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RouteDecision {
    General,
    Email,
    Calendar,
    DocumentQa,
}

impl RouteDecision {
    pub fn as_str(&self) -> &'static str {
        match self {
            RouteDecision::General => "general",
            RouteDecision::Email => "email",
            RouteDecision::Calendar => "calendar",
            RouteDecision::DocumentQa => "document_qa",
        }
    }
}

impl fmt::Display for RouteDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Tool results
// =============================================================================

/// Result of a tool adapter call.
///
/// Adapters never fail with an error; every outcome is one of these cases so
/// callers can branch without matching on phrases.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ToolOutcome {
    /// Formatted summary of the results.
    Ok(String),
    /// The call succeeded and matched nothing.
    NotFound,
    /// No valid or refreshable credential is available.
    AuthRequired,
    /// The external API failed; carries a description.
    ApiError(String),
}

impl ToolOutcome {
    pub fn is_ok(&self) -> bool {
        matches!(self, ToolOutcome::Ok(_))
    }
}

/// A passage returned by the retrieval adapter.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Passage {
    pub text: String,
    /// Source document path, relative to the ingestion directory.
    pub source: String,
    /// Cosine similarity to the query.
    pub score: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_pairs_flattens_in_order() {
        let history = ConversationHistory::from_pairs(vec![("q1", "a1"), ("q2", "a2")]);
        let turns = history.turns();
        assert_eq!(turns.len(), 4);
        assert_eq!(turns[0], ChatTurn::user("q1"));
        assert_eq!(turns[1], ChatTurn::assistant("a1"));
        assert_eq!(turns[2], ChatTurn::user("q2"));
        assert_eq!(turns[3], ChatTurn::assistant("a2"));
        assert_eq!(history.exchange_count(), 2);
    }

    #[test]
    fn test_pairs_survive_conversion() {
        let pairs = vec![
            ("안녕".to_string(), "안녕하세요!".to_string()),
            ("오늘 일정".to_string(), "일정이 없습니다.".to_string()),
        ];
        let history = ConversationHistory::from_pairs(pairs.clone());
        assert_eq!(history.to_pairs(), pairs);
    }

    #[test]
    fn test_with_exchange_does_not_mutate_original() {
        let history = ConversationHistory::from_pairs(vec![("q1", "a1")]);
        let next = history.with_exchange("q2", "a2");
        assert_eq!(history.len(), 2);
        assert_eq!(next.len(), 4);
        assert_eq!(next.turns()[2], ChatTurn::user("q2"));
    }

    #[test]
    fn test_to_pairs_drops_unanswered_trailing_user_turn() {
        let history = ConversationHistory {
            turns: vec![
                ChatTurn::user("q1"),
                ChatTurn::assistant("a1"),
                ChatTurn::user("pending"),
            ],
        };
        assert_eq!(history.to_pairs(), vec![("q1".to_string(), "a1".to_string())]);
    }

    #[test]
    fn test_empty_history() {
        let history = ConversationHistory::from_pairs(Vec::<(String, String)>::new());
        assert!(history.is_empty());
        assert_eq!(history.exchange_count(), 0);
    }

    #[test]
    fn test_route_decision_labels() {
        assert_eq!(RouteDecision::General.to_string(), "general");
        assert_eq!(RouteDecision::Email.to_string(), "email");
        assert_eq!(RouteDecision::Calendar.to_string(), "calendar");
        assert_eq!(RouteDecision::DocumentQa.to_string(), "document_qa");
        let json = serde_json::to_string(&RouteDecision::DocumentQa).unwrap();
        assert_eq!(json, "\"document_qa\"");
    }

    #[test]
    fn test_tool_outcome_is_ok() {
        assert!(ToolOutcome::Ok("x".into()).is_ok());
        assert!(!ToolOutcome::NotFound.is_ok());
        assert!(!ToolOutcome::AuthRequired.is_ok());
        assert!(!ToolOutcome::ApiError("boom".into()).is_ok());
    }
}
