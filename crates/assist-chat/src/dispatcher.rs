//! Runs the response chain for a route.
//!
//! Each dispatch makes at most one tool or retrieval call followed by at
//! most one model call, in sequence.

use std::sync::Arc;

use assist_core::config::RepliesConfig;
use assist_core::types::{ConversationHistory, RouteDecision, ToolOutcome};
use assist_google::{calendar, gmail, CalendarTool, MailTool};
use assist_llm::{LanguageModel, LlmError, PromptRequest};
use assist_vector::Retriever;
use tracing::{debug, warn};

use crate::chains;
use crate::error::ChatError;

/// Owns the collaborators every chain needs.
pub struct Dispatcher {
    llm: Arc<dyn LanguageModel>,
    mail: Arc<dyn MailTool>,
    calendar: Arc<dyn CalendarTool>,
    retriever: Arc<dyn Retriever>,
    replies: RepliesConfig,
}

impl Dispatcher {
    pub fn new(
        llm: Arc<dyn LanguageModel>,
        mail: Arc<dyn MailTool>,
        calendar: Arc<dyn CalendarTool>,
        retriever: Arc<dyn Retriever>,
        replies: RepliesConfig,
    ) -> Self {
        Self {
            llm,
            mail,
            calendar,
            retriever,
            replies,
        }
    }

    pub fn replies(&self) -> &RepliesConfig {
        &self.replies
    }

    /// Produce the reply text for `message` along `route`.
    pub async fn dispatch(
        &self,
        route: RouteDecision,
        message: &str,
        history: &ConversationHistory,
    ) -> Result<String, ChatError> {
        let turns = history.turns();
        match route {
            RouteDecision::General => self.generate(chains::general(message, turns)).await,
            RouteDecision::Email => {
                let outcome = self.mail.search_email(message).await;
                if let Some(reply) = self.short_circuit(&outcome, &self.replies.no_mail) {
                    return Ok(reply);
                }
                let tool_output = gmail::render(&outcome);
                self.generate(chains::email(message, turns, &tool_output, &self.replies.no_mail))
                    .await
            }
            RouteDecision::Calendar => {
                let outcome = self.calendar.list_today_events().await;
                if let Some(reply) = self.short_circuit(&outcome, &self.replies.no_events) {
                    return Ok(reply);
                }
                let tool_output = calendar::render(&outcome);
                self.generate(chains::calendar(
                    message,
                    turns,
                    &tool_output,
                    &self.replies.no_events,
                ))
                .await
            }
            RouteDecision::DocumentQa => {
                let passages = self.retriever.find_relevant(message).await?;
                debug!(passages = passages.len(), "Document context retrieved");
                match self
                    .llm
                    .generate(&chains::document_qa(message, turns, &passages))
                    .await
                {
                    Ok(answer) => Ok(answer),
                    Err(LlmError::EmptyResponse) => Ok(chains::DOCUMENT_FALLBACK.to_string()),
                    Err(e) => Err(e.into()),
                }
            }
        }
    }

    /// Fixed replies for outcomes the model has nothing to summarize.
    fn short_circuit(&self, outcome: &ToolOutcome, no_result: &str) -> Option<String> {
        match outcome {
            ToolOutcome::NotFound => Some(no_result.to_string()),
            ToolOutcome::AuthRequired => Some(self.replies.auth_required.clone()),
            ToolOutcome::ApiError(detail) => {
                warn!(%detail, "Tool call failed; passing error to summarizer");
                None
            }
            ToolOutcome::Ok(_) => None,
        }
    }

    async fn generate(&self, prompt: PromptRequest) -> Result<String, ChatError> {
        Ok(self.llm.generate(&prompt).await?)
    }
}


#[cfg(test)]
mod tests {
    use super::testing::*;
    use super::*;
    use assist_core::types::{ChatTurn, Passage};

    #[tokio::test]
    async fn test_general_calls_model_only() {
        let spies = Spies::new(SpyModel::replying("안녕하세요!"));
        let history = ConversationHistory::from_pairs(vec![("q1", "a1")]);
        let reply = spies
            .dispatcher()
            .dispatch(RouteDecision::General, "안녕", &history)
            .await
            .unwrap();

        assert_eq!(reply, "안녕하세요!");
        assert_eq!(spies.tool_calls(), 0);
        assert_eq!(spies.llm.call_count(), 1);
        let prompt = spies.llm.last_prompt().unwrap();
        assert_eq!(prompt.history, vec![ChatTurn::user("q1"), ChatTurn::assistant("a1")]);
        assert_eq!(prompt.user, "안녕");
    }

    #[tokio::test]
    async fn test_email_summarizes_tool_output() {
        let spies = Spies::new(SpyModel::replying("메일 2건이 있습니다."))
            .with_mail(ToolOutcome::Ok("제목: A\n보낸 사람: B\n---".into()));
        let reply = spies
            .dispatcher()
            .dispatch(RouteDecision::Email, "메일 요약", &ConversationHistory::new())
            .await
            .unwrap();

        assert_eq!(reply, "메일 2건이 있습니다.");
        assert_eq!(spies.mail.queries.lock().unwrap().as_slice(), ["메일 요약"]);
        let prompt = spies.llm.last_prompt().unwrap();
        assert!(prompt.user.contains("제목: A\n보낸 사람: B\n---"));
    }

    #[tokio::test]
    async fn test_email_not_found_skips_model() {
        let spies = Spies::new(SpyModel::default()).with_mail(ToolOutcome::NotFound);
        let reply = spies
            .dispatcher()
            .dispatch(RouteDecision::Email, "메일", &ConversationHistory::new())
            .await
            .unwrap();
        assert_eq!(reply, RepliesConfig::default().no_mail);
        assert_eq!(spies.llm.call_count(), 0);
    }

    #[tokio::test]
    async fn test_calendar_no_events_is_fixed_reply() {
        let spies = Spies::new(SpyModel::default()).with_calendar(ToolOutcome::NotFound);
        let reply = spies
            .dispatcher()
            .dispatch(RouteDecision::Calendar, "오늘 일정 알려줘", &ConversationHistory::new())
            .await
            .unwrap();
        assert_eq!(reply, "오늘 예정된 일정이 없습니다.");
        assert!(!reply.is_empty());
        assert_eq!(spies.calendar.call_count(), 1);
        assert_eq!(spies.llm.call_count(), 0);
    }

    #[tokio::test]
    async fn test_auth_required_reply() {
        let spies = Spies::new(SpyModel::default()).with_calendar(ToolOutcome::AuthRequired);
        let reply = spies
            .dispatcher()
            .dispatch(RouteDecision::Calendar, "일정", &ConversationHistory::new())
            .await
            .unwrap();
        assert_eq!(reply, RepliesConfig::default().auth_required);
        assert_eq!(spies.llm.call_count(), 0);
    }

    #[tokio::test]
    async fn test_api_error_text_reaches_summarizer() {
        let spies = Spies::new(SpyModel::replying("오류가 있었습니다."))
            .with_calendar(ToolOutcome::ApiError("503 Service Unavailable".into()));
        let reply = spies
            .dispatcher()
            .dispatch(RouteDecision::Calendar, "일정", &ConversationHistory::new())
            .await
            .unwrap();
        assert_eq!(reply, "오류가 있었습니다.");
        let prompt = spies.llm.last_prompt().unwrap();
        assert!(prompt
            .user
            .contains("Calendar API 호출 중 오류 발생: 503 Service Unavailable"));
    }

    #[tokio::test]
    async fn test_document_qa_uses_passages() {
        let passages = vec![Passage {
            text: "매출 10% 증가".into(),
            source: "q3.txt".into(),
            score: 0.91,
        }];
        let spies = Spies::new(SpyModel::replying("매출이 10% 늘었습니다."))
            .with_retriever(SpyRetriever::new(passages));
        let reply = spies
            .dispatcher()
            .dispatch(RouteDecision::DocumentQa, "보고서 요약", &ConversationHistory::new())
            .await
            .unwrap();
        assert_eq!(reply, "매출이 10% 늘었습니다.");
        assert_eq!(spies.retriever.call_count(), 1);
        let system = spies.llm.last_prompt().unwrap().system.unwrap();
        assert!(system.ends_with("매출 10% 증가"));
    }

    #[tokio::test]
    async fn test_document_qa_empty_answer_falls_back() {
        let spies = Spies::new(SpyModel::replying(""));
        let reply = spies
            .dispatcher()
            .dispatch(RouteDecision::DocumentQa, "알려줘", &ConversationHistory::new())
            .await
            .unwrap();
        assert_eq!(reply, chains::DOCUMENT_FALLBACK);
    }

    #[tokio::test]
    async fn test_retrieval_failure_propagates() {
        let spies =
            Spies::new(SpyModel::default()).with_retriever(SpyRetriever::failing("index gone"));
        let err = spies
            .dispatcher()
            .dispatch(RouteDecision::DocumentQa, "알려줘", &ConversationHistory::new())
            .await
            .unwrap_err();
        assert!(matches!(err, ChatError::RetrievalError(_)));
        assert_eq!(spies.llm.call_count(), 0);
    }

    #[tokio::test]
    async fn test_model_failure_propagates() {
        let spies = Spies::new(SpyModel::failing("connection reset"));
        let err = spies
            .dispatcher()
            .dispatch(RouteDecision::General, "안녕", &ConversationHistory::new())
            .await
            .unwrap_err();
        assert!(matches!(err, ChatError::LlmError(msg) if msg.contains("connection reset")));
    }
}
