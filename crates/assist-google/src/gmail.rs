//! Gmail search adapter.

use std::sync::Arc;
use std::time::Duration;

use assist_core::config::GoogleConfig;
use assist_core::types::ToolOutcome;
use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::credential::CredentialManager;
use crate::error::AuthError;
use crate::GMAIL_READONLY;

pub const NO_MAIL_FOUND: &str = "해당 쿼리에 대한 메일을 찾을 수 없습니다.";
const MISSING_SUBJECT: &str = "제목 없음";
const MISSING_SENDER: &str = "발신자 불명";

/// Searches the user's mailbox.
#[async_trait]
pub trait MailTool: Send + Sync {
    /// Summarize the most recent messages matching `query`.
    async fn search_email(&self, query: &str) -> ToolOutcome;
}

/// Text form of a mail outcome, as fed to the summarizer prompt.
pub fn render(outcome: &ToolOutcome) -> String {
    match outcome {
        ToolOutcome::Ok(text) => text.clone(),
        ToolOutcome::NotFound => NO_MAIL_FOUND.to_string(),
        ToolOutcome::AuthRequired => AuthError::AuthRequired.to_string(),
        ToolOutcome::ApiError(detail) => format!("Gmail API 호출 중 오류 발생: {}", detail),
    }
}

#[derive(Debug, Deserialize)]
struct MessageList {
    #[serde(default)]
    messages: Vec<MessageRef>,
}

#[derive(Debug, Deserialize)]
struct MessageRef {
    id: String,
}

#[derive(Debug, Deserialize)]
struct Message {
    #[serde(default)]
    payload: Option<Payload>,
}

#[derive(Debug, Deserialize)]
struct Payload {
    #[serde(default)]
    headers: Vec<Header>,
}

#[derive(Debug, Deserialize)]
struct Header {
    name: String,
    value: String,
}

impl Message {
    fn header(&self, name: &str) -> Option<&str> {
        self.payload
            .as_ref()?
            .headers
            .iter()
            .find(|h| h.name.eq_ignore_ascii_case(name))
            .map(|h| h.value.as_str())
    }

    fn summary(&self) -> String {
        format!(
            "제목: {}\n보낸 사람: {}\n---",
            self.header("Subject").unwrap_or(MISSING_SUBJECT),
            self.header("From").unwrap_or(MISSING_SENDER),
        )
    }
}

/// Gmail REST client.
pub struct GmailClient {
    http: reqwest::Client,
    api_base: String,
    max_results: u32,
    credentials: Arc<CredentialManager>,
}

impl GmailClient {
    pub fn new(config: &GoogleConfig, credentials: Arc<CredentialManager>) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;
        Ok(Self {
            http,
            api_base: config.gmail_api_base.trim_end_matches('/').to_string(),
            max_results: config.max_email_results,
            credentials,
        })
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        url: &str,
        token: &str,
        query: &[(&str, String)],
    ) -> Result<T, String> {
        let response = self
            .http
            .get(url)
            .bearer_auth(token)
            .query(query)
            .send()
            .await
            .map_err(|e| e.to_string())?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(format!("{} {}", status, body));
        }
        response.json::<T>().await.map_err(|e| e.to_string())
    }

    async fn search(&self, query: &str, token: &str) -> Result<Vec<String>, String> {
        let list: MessageList = self
            .get_json(
                &format!("{}/users/me/messages", self.api_base),
                token,
                &[
                    ("q", query.to_string()),
                    ("maxResults", self.max_results.to_string()),
                ],
            )
            .await?;

        let mut summaries = Vec::with_capacity(list.messages.len());
        for message in &list.messages {
            let detail: Message = self
                .get_json(
                    &format!("{}/users/me/messages/{}", self.api_base, message.id),
                    token,
                    &[
                        ("format", "metadata".to_string()),
                        ("metadataHeaders", "Subject".to_string()),
                        ("metadataHeaders", "From".to_string()),
                    ],
                )
                .await?;
            summaries.push(detail.summary());
        }
        Ok(summaries)
    }
}

#[async_trait]
impl MailTool for GmailClient {
    async fn search_email(&self, query: &str) -> ToolOutcome {
        let credential = match self.credentials.get_valid_credential(&[GMAIL_READONLY]).await {
            Ok(c) => c,
            Err(AuthError::AuthRequired) => return ToolOutcome::AuthRequired,
            Err(e) => {
                warn!(error = %e, "Gmail credential unavailable");
                return ToolOutcome::AuthRequired;
            }
        };

        match self.search(query, &credential.access_token).await {
            Ok(summaries) if summaries.is_empty() => ToolOutcome::NotFound,
            Ok(summaries) => {
                debug!(count = summaries.len(), "Gmail search returned messages");
                ToolOutcome::Ok(summaries.join("\n"))
            }
            Err(detail) => {
                warn!(%detail, "Gmail API call failed");
                ToolOutcome::ApiError(detail)
            }
        }
    }
}
