use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{AssistError, Result};

/// Top-level configuration for the assistant.
///
/// Loaded from `~/.assist/config.toml` by default. Each section corresponds
/// to one collaborator or cross-cutting concern.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AssistConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub google: GoogleConfig,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    #[serde(default)]
    pub router: RouterConfig,
    #[serde(default)]
    pub replies: RepliesConfig,
}

impl AssistConfig {
    /// Load configuration from a TOML file.
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: AssistConfig = toml::from_str(&content)?;
        info!("Configuration loaded from {}", path.display());
        Ok(config)
    }

    /// Load configuration from a TOML file, falling back to defaults if the
    /// file does not exist or cannot be parsed.
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(config) => config,
            Err(e) => {
                warn!(
                    "Failed to load config from {}: {}. Using defaults.",
                    path.display(),
                    e
                );
                Self::default()
            }
        }
    }

    /// Save the current configuration to a TOML file.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| AssistError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        info!("Configuration saved to {}", path.display());
        Ok(())
    }

    /// Apply environment overrides.
    ///
    /// `GOOGLE_API_KEY` replaces `llm.api_key` when set and non-empty.
    pub fn apply_env(&mut self) {
        if let Ok(key) = std::env::var("GOOGLE_API_KEY") {
            if !key.trim().is_empty() {
                self.llm.api_key = key;
            }
        }
    }
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Log level: trace, debug, info, warn, error.
    pub log_level: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

/// HTTP server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind address.
    pub host: String,
    /// Bind port.
    pub port: u16,
    /// Allowed CORS origins. `"*"` allows any origin.
    pub cors_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8000,
            cors_origins: vec!["http://localhost:8501".to_string()],
        }
    }
}

/// Hosted language model settings (Gemini REST API).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// API key for the generative language API.
    pub api_key: String,
    /// Chat model name.
    pub model: String,
    /// Embedding model name, shared by ingestion and retrieval.
    pub embedding_model: String,
    /// Sampling temperature.
    pub temperature: f32,
    /// Base URL of the REST API.
    pub api_base: String,
    /// Per-request timeout in seconds.
    pub request_timeout_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            model: "gemini-1.5-flash-latest".to_string(),
            embedding_model: "text-embedding-004".to_string(),
            temperature: 0.7,
            api_base: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            request_timeout_secs: 60,
        }
    }
}

/// Google OAuth and Workspace API settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GoogleConfig {
    /// OAuth client secrets JSON downloaded from the Cloud Console.
    pub credentials_path: String,
    /// Where the authorized user token is persisted.
    pub token_path: String,
    /// OAuth redirect URI registered for the web client.
    pub redirect_uri: String,
    /// Authorization endpoint.
    pub auth_uri: String,
    /// Token endpoint (code exchange and refresh).
    pub token_uri: String,
    /// Gmail REST base URL.
    pub gmail_api_base: String,
    /// Calendar REST base URL.
    pub calendar_api_base: String,
    /// Maximum number of messages returned by an email search.
    pub max_email_results: u32,
    /// UTC offset in hours that defines "today" for calendar lookups.
    pub utc_offset_hours: i32,
    /// Per-request timeout in seconds.
    pub request_timeout_secs: u64,
}

impl Default for GoogleConfig {
    fn default() -> Self {
        Self {
            credentials_path: "./credentials.json".to_string(),
            token_path: "./token.json".to_string(),
            redirect_uri: "http://localhost:8000/auth/google/callback".to_string(),
            auth_uri: "https://accounts.google.com/o/oauth2/v2/auth".to_string(),
            token_uri: "https://oauth2.googleapis.com/token".to_string(),
            gmail_api_base: "https://gmail.googleapis.com/gmail/v1".to_string(),
            calendar_api_base: "https://www.googleapis.com/calendar/v3".to_string(),
            max_email_results: 5,
            utc_offset_hours: 9,
            request_timeout_secs: 30,
        }
    }
}

/// Document ingestion and retrieval settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    /// Directory holding the prebuilt index.
    pub vector_store_path: String,
    /// Directory scanned for `*.txt` documents during ingestion.
    pub document_source_dir: String,
    /// Maximum chunk length in characters.
    pub chunk_size: usize,
    /// Characters shared between consecutive chunks.
    pub chunk_overlap: usize,
    /// Number of passages returned per query.
    pub top_k: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            vector_store_path: "./vector_store".to_string(),
            document_source_dir: "./documents".to_string(),
            chunk_size: 1000,
            chunk_overlap: 100,
            top_k: 4,
        }
    }
}

/// Keyword groups for intent routing.
///
/// Groups are checked in fixed priority order: email, calendar, document.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RouterConfig {
    pub email_keywords: Vec<String>,
    pub calendar_keywords: Vec<String>,
    pub document_keywords: Vec<String>,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            email_keywords: vec!["메일".to_string(), "gmail".to_string()],
            calendar_keywords: vec![
                "일정".to_string(),
                "캘린더".to_string(),
                "calendar".to_string(),
            ],
            document_keywords: vec!["보고서 요약".to_string(), "알려줘".to_string()],
        }
    }
}

/// Fixed reply phrasings returned without a model call.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RepliesConfig {
    /// Email pipeline reply when the search matched nothing.
    pub no_mail: String,
    /// Calendar pipeline reply when there are no events today.
    pub no_events: String,
    /// Reply when Google authorization is missing or cannot be refreshed.
    pub auth_required: String,
    /// Prefix for replies describing an internal failure.
    pub error_prefix: String,
    /// Reply for an empty message.
    pub empty_message: String,
    /// Reply for a message over the length limit.
    pub too_long: String,
}

impl Default for RepliesConfig {
    fn default() -> Self {
        Self {
            no_mail: "검색된 메일이 없습니다.".to_string(),
            no_events: "오늘 예정된 일정이 없습니다.".to_string(),
            auth_required:
                "Google 계정 인증이 필요합니다. /auth/google 에서 로그인한 뒤 다시 시도해주세요."
                    .to_string(),
            error_prefix: "죄송합니다, 요청을 처리하는 중 오류가 발생했습니다".to_string(),
            empty_message: "메시지가 비어 있습니다. 질문을 입력해주세요.".to_string(),
            too_long: "메시지가 너무 깁니다. 조금 더 짧게 입력해주세요.".to_string(),
        }
    }
}
