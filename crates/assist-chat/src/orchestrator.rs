//! Chat orchestrator: validates the message, routes it, dispatches it, and
//! turns every failure into reply text.

use assist_core::config::RepliesConfig;
use assist_core::types::{ConversationHistory, RouteDecision};
use tracing::{debug, error, info};

use crate::dispatcher::Dispatcher;
use crate::error::ChatError;
use crate::router::IntentClassifier;
use crate::types::{ChatRequest, ChatResponse};

/// Maximum message length in characters.
pub const MAX_MESSAGE_LENGTH: usize = 4000;

/// Result of one conversational step.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatOutcome {
    pub response: String,
    /// `None` when the message was rejected before routing.
    pub route: Option<RouteDecision>,
    /// The input history extended with this exchange.
    pub history: ConversationHistory,
}

pub struct ChatOrchestrator {
    classifier: Box<dyn IntentClassifier>,
    dispatcher: Dispatcher,
}

impl ChatOrchestrator {
    pub fn new(classifier: Box<dyn IntentClassifier>, dispatcher: Dispatcher) -> Self {
        Self {
            classifier,
            dispatcher,
        }
    }

    fn replies(&self) -> &RepliesConfig {
        self.dispatcher.replies()
    }

    fn validate(message: &str) -> Result<(), ChatError> {
        if message.trim().is_empty() {
            return Err(ChatError::EmptyMessage);
        }
        if message.chars().count() > MAX_MESSAGE_LENGTH {
            return Err(ChatError::MessageTooLong(MAX_MESSAGE_LENGTH));
        }
        Ok(())
    }

    /// Produce a reply for `message`. Never fails: dispatch errors become a
    /// reply that starts with the configured error prefix.
    pub async fn respond(&self, message: &str, history: &ConversationHistory) -> ChatOutcome {
        if let Err(e) = Self::validate(message) {
            debug!(error = %e, "Rejected chat message");
            let response = match e {
                ChatError::MessageTooLong(_) => self.replies().too_long.clone(),
                _ => self.replies().empty_message.clone(),
            };
            return ChatOutcome {
                history: history.with_exchange(message, response.as_str()),
                response,
                route: None,
            };
        }

        let route = self.classifier.classify(message, history);
        debug!(route = %route, history_turns = history.len(), "Message routed");

        let response = match self.dispatcher.dispatch(route, message, history).await {
            Ok(text) => text,
            Err(e) => {
                error!(route = %route, error = %e, "Chat dispatch failed");
                format!("{}: {}", self.replies().error_prefix, e)
            }
        };
        info!(route = %route, response_chars = response.chars().count(), "Chat reply ready");

        ChatOutcome {
            history: history.with_exchange(message, response.as_str()),
            response,
            route: Some(route),
        }
    }

    /// Transport-level entry point for `POST /api/chat`.
    pub async fn handle(&self, request: &ChatRequest) -> ChatResponse {
        let outcome = self.respond(&request.message, &request.conversation()).await;
        ChatResponse {
            response: outcome.response,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatcher::testing::*;
    use crate::router::KeywordRouter;
    use assist_core::types::{ChatTurn, ToolOutcome};

    fn orchestrator(spies: &Spies) -> ChatOrchestrator {
        ChatOrchestrator::new(Box::new(KeywordRouter::default()), spies.dispatcher())
    }

    #[tokio::test]
    async fn test_greeting_goes_to_general_without_tools() {
        let spies = Spies::new(SpyModel::replying("안녕하세요! 무엇을 도와드릴까요?"));
        let orch = orchestrator(&spies);
        let response = orch.handle(&ChatRequest::new("안녕")).await;

        assert_eq!(response.response, "안녕하세요! 무엇을 도와드릴까요?");
        assert_eq!(spies.tool_calls(), 0);
        assert_eq!(spies.llm.call_count(), 1);
    }

    #[tokio::test]
    async fn test_today_schedule_with_no_events() {
        let spies = Spies::new(SpyModel::default()).with_calendar(ToolOutcome::NotFound);
        let orch = orchestrator(&spies);
        let request: ChatRequest =
            serde_json::from_str(r#"{"message":"오늘 일정 알려줘","history":[]}"#).unwrap();

        let response = orch.handle(&request).await;
        assert_eq!(response.response, "오늘 예정된 일정이 없습니다.");
        assert_eq!(spies.calendar.call_count(), 1);
        assert_eq!(spies.retriever.call_count(), 0);
    }

    #[tokio::test]
    async fn test_history_pairs_reach_chain_in_order() {
        let spies = Spies::new(SpyModel::replying("ok"));
        let orch = orchestrator(&spies);
        let request = ChatRequest {
            message: "그리고?".into(),
            history: (1..=3)
                .map(|i| (format!("q{i}"), format!("a{i}")))
                .collect(),
        };
        orch.handle(&request).await;

        let prompt = spies.llm.last_prompt().unwrap();
        assert_eq!(prompt.history.len(), 6);
        for (i, pair) in prompt.history.chunks(2).enumerate() {
            assert_eq!(pair[0], ChatTurn::user(format!("q{}", i + 1)));
            assert_eq!(pair[1], ChatTurn::assistant(format!("a{}", i + 1)));
        }
    }

    #[tokio::test]
    async fn test_dispatch_error_becomes_reply() {
        let spies = Spies::new(SpyModel::failing("quota exceeded"));
        let orch = orchestrator(&spies);
        let outcome = orch.respond("안녕", &ConversationHistory::new()).await;

        assert!(outcome
            .response
            .starts_with("죄송합니다, 요청을 처리하는 중 오류가 발생했습니다: "));
        assert!(outcome.response.contains("quota exceeded"));
        assert_eq!(outcome.route, Some(RouteDecision::General));
    }

    #[tokio::test]
    async fn test_retrieval_error_becomes_reply() {
        let spies =
            Spies::new(SpyModel::default()).with_retriever(SpyRetriever::failing("index gone"));
        let orch = orchestrator(&spies);
        let outcome = orch
            .respond("보고서 요약 해줘", &ConversationHistory::new())
            .await;
        assert_eq!(outcome.route, Some(RouteDecision::DocumentQa));
        assert!(outcome.response.contains("index gone"));
    }

    #[tokio::test]
    async fn test_empty_message_rejected_without_calls() {
        let spies = Spies::new(SpyModel::default());
        let orch = orchestrator(&spies);
        let outcome = orch.respond("   ", &ConversationHistory::new()).await;

        assert_eq!(outcome.response, RepliesConfig::default().empty_message);
        assert_eq!(outcome.route, None);
        assert_eq!(spies.llm.call_count(), 0);
        assert_eq!(spies.tool_calls(), 0);
    }

    #[tokio::test]
    async fn test_too_long_message_rejected() {
        let spies = Spies::new(SpyModel::default());
        let orch = orchestrator(&spies);
        let long = "가".repeat(MAX_MESSAGE_LENGTH + 1);
        let outcome = orch.respond(&long, &ConversationHistory::new()).await;
        assert_eq!(outcome.response, RepliesConfig::default().too_long);
        assert_eq!(spies.llm.call_count(), 0);

        // exactly at the limit is accepted
        let at_limit = "가".repeat(MAX_MESSAGE_LENGTH);
        let outcome = orch.respond(&at_limit, &ConversationHistory::new()).await;
        assert_eq!(outcome.route, Some(RouteDecision::General));
    }

    #[tokio::test]
    async fn test_outcome_history_extended() {
        let spies = Spies::new(SpyModel::replying("두 번째 답"));
        let orch = orchestrator(&spies);
        let history = ConversationHistory::from_pairs(vec![("첫 질문", "첫 답")]);
        let outcome = orch.respond("두 번째 질문", &history).await;

        assert_eq!(outcome.history.exchange_count(), 2);
        assert_eq!(
            outcome.history.to_pairs()[1],
            ("두 번째 질문".to_string(), "두 번째 답".to_string())
        );
        // input history untouched
        assert_eq!(history.exchange_count(), 1);
    }

    #[tokio::test]
    async fn test_mail_keyword_routes_to_mail_tool() {
        let spies = Spies::new(SpyModel::default()).with_mail(ToolOutcome::NotFound);
        let orch = orchestrator(&spies);
        let response = orch.handle(&ChatRequest::new("메일 일정 확인")).await;
        assert_eq!(response.response, "검색된 메일이 없습니다.");
        assert_eq!(spies.mail.call_count(), 1);
        assert_eq!(spies.calendar.call_count(), 0);
    }
}
