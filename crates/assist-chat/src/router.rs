//! Intent routing.
//!
//! Maps a message to a [`RouteDecision`] by keyword matching. Matching is a
//! case-insensitive substring test against ordered keyword groups; the first
//! group with a hit wins.

use assist_core::config::RouterConfig;
use assist_core::types::{ConversationHistory, RouteDecision};

/// Decides which pipeline handles a message. Must be pure and infallible.
pub trait IntentClassifier: Send + Sync {
    fn classify(&self, message: &str, history: &ConversationHistory) -> RouteDecision;
}

/// Keyword classifier with a fixed group priority:
/// email, then calendar, then document, otherwise general.
#[derive(Debug, Clone)]
pub struct KeywordRouter {
    groups: Vec<(RouteDecision, Vec<String>)>,
}

impl KeywordRouter {
    pub fn new(email: &[String], calendar: &[String], document: &[String]) -> Self {
        let normalize = |keywords: &[String]| -> Vec<String> {
            keywords
                .iter()
                .map(|k| k.trim().to_lowercase())
                .filter(|k| !k.is_empty())
                .collect()
        };
        Self {
            groups: vec![
                (RouteDecision::Email, normalize(email)),
                (RouteDecision::Calendar, normalize(calendar)),
                (RouteDecision::DocumentQa, normalize(document)),
            ],
        }
    }

    pub fn from_config(config: &RouterConfig) -> Self {
        Self::new(
            &config.email_keywords,
            &config.calendar_keywords,
            &config.document_keywords,
        )
    }
}

impl Default for KeywordRouter {
    fn default() -> Self {
        Self::from_config(&RouterConfig::default())
    }
}

impl IntentClassifier for KeywordRouter {
    fn classify(&self, message: &str, _history: &ConversationHistory) -> RouteDecision {
        let lowered = message.to_lowercase();
        self.groups
            .iter()
            .find(|(_, keywords)| keywords.iter().any(|k| lowered.contains(k.as_str())))
            .map(|(route, _)| *route)
            .unwrap_or(RouteDecision::General)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classify(message: &str) -> RouteDecision {
        KeywordRouter::default().classify(message, &ConversationHistory::new())
    }

    #[test]
    fn test_email_keywords() {
        assert_eq!(classify("최근 메일 보여줘"), RouteDecision::Email);
        assert_eq!(classify("check my Gmail"), RouteDecision::Email);
        assert_eq!(classify("GMAIL inbox"), RouteDecision::Email);
    }

    #[test]
    fn test_calendar_keywords() {
        assert_eq!(classify("오늘 일정 알려줘"), RouteDecision::Calendar);
        assert_eq!(classify("캘린더 확인"), RouteDecision::Calendar);
        assert_eq!(classify("What's on my Calendar?"), RouteDecision::Calendar);
    }

    #[test]
    fn test_document_keywords() {
        assert_eq!(classify("3분기 보고서 요약 부탁해"), RouteDecision::DocumentQa);
        assert_eq!(classify("프로젝트 현황 알려줘"), RouteDecision::DocumentQa);
    }

    #[test]
    fn test_general_fallback() {
        assert_eq!(classify("안녕"), RouteDecision::General);
        assert_eq!(classify(""), RouteDecision::General);
        assert_eq!(classify("보고서"), RouteDecision::General);
    }

    #[test]
    fn test_email_beats_calendar() {
        assert_eq!(classify("메일로 온 일정 정리해줘"), RouteDecision::Email);
    }

    #[test]
    fn test_calendar_beats_document() {
        // "알려줘" is a document keyword but "일정" wins.
        assert_eq!(classify("일정 알려줘"), RouteDecision::Calendar);
    }

    #[test]
    fn test_history_is_ignored() {
        let router = KeywordRouter::default();
        let history = ConversationHistory::from_pairs(vec![("메일 찾아줘", "검색된 메일이 없습니다.")]);
        assert_eq!(router.classify("고마워", &history), RouteDecision::General);
    }

    #[test]
    fn test_custom_keywords_are_normalized() {
        let router = KeywordRouter::new(
            &["  INBOX ".to_string(), "".to_string()],
            &[],
            &["Docs".to_string()],
        );
        let empty = ConversationHistory::new();
        assert_eq!(router.classify("open inbox", &empty), RouteDecision::Email);
        assert_eq!(router.classify("search docs", &empty), RouteDecision::DocumentQa);
        // empty keyword must not match everything
        assert_eq!(router.classify("hello", &empty), RouteDecision::General);
    }
}
