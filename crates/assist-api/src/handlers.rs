//! Route handler functions for all API endpoints.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{Html, Redirect};
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use assist_chat::{ChatRequest, ChatResponse};

use crate::error::ApiError;
use crate::state::AppState;

// =============================================================================
// Response types
// =============================================================================

#[derive(Debug, Serialize, Deserialize)]
pub struct RootResponse {
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_secs: u64,
    pub indexed_chunks: usize,
    /// `None` while a token refresh holds the credential lock.
    pub google_authorized: Option<bool>,
}

/// Query string Google appends to the redirect URI.
#[derive(Debug, Deserialize)]
pub struct CallbackParams {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
}

// =============================================================================
// Handlers
// =============================================================================

/// GET / - service banner.
pub async fn root() -> Json<RootResponse> {
    Json(RootResponse {
        message: "AI Assist Google Backend is running.".to_string(),
    })
}

/// GET /health - liveness plus index and authorization status.
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_secs: state.start_time.elapsed().as_secs(),
        indexed_chunks: state.indexed_chunks,
        google_authorized: state.credentials.authorization_status().await,
    })
}

/// POST /api/chat - one conversational step.
///
/// Always 200 for a well-formed body; chat failures are reported inside
/// `response`.
pub async fn chat(
    State(state): State<AppState>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<ChatResponse>, ApiError> {
    let Json(request) = payload?;
    Ok(Json(state.orchestrator.handle(&request).await))
}

/// GET /auth/google - redirect the browser to the Google consent screen.
pub async fn auth_start(State(state): State<AppState>) -> Result<Redirect, ApiError> {
    let url = state.credentials.authorization_url()?;
    info!("Redirecting to Google consent screen");
    Ok(Redirect::temporary(&url))
}

/// GET /auth/google/callback - exchange the authorization code.
pub async fn auth_callback(
    State(state): State<AppState>,
    Query(params): Query<CallbackParams>,
) -> (StatusCode, Html<String>) {
    if let Some(error) = params.error {
        warn!(error = %error, "Google authorization denied");
        return (
            StatusCode::BAD_REQUEST,
            auth_page("Google 인증 실패", &format!("인증이 거부되었습니다: {error}")),
        );
    }

    let (Some(code), Some(oauth_state)) = (params.code, params.state) else {
        return (
            StatusCode::BAD_REQUEST,
            auth_page("Google 인증 실패", "code 또는 state 값이 없습니다."),
        );
    };

    match state
        .credentials
        .complete_authorization(&code, &oauth_state)
        .await
    {
        Ok(()) => (
            StatusCode::OK,
            auth_page(
                "Google 인증 완료",
                "Gmail 및 Calendar 접근 권한이 저장되었습니다. 이 창을 닫아도 됩니다.",
            ),
        ),
        Err(e) => {
            warn!(error = %e, "Google authorization failed");
            let status = ApiError::from(e).status();
            (status, auth_page("Google 인증 실패", "인증을 완료하지 못했습니다."))
        }
    }
}

fn auth_page(title: &str, body: &str) -> Html<String> {
    let title = html_escape(title);
    let body = html_escape(body);
    Html(format!(
        "<!DOCTYPE html><html><head><meta charset=\"utf-8\"><title>{title}</title></head>\
         <body><h1>{title}</h1><p>{body}</p></body></html>"
    ))
}

fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_html_escape() {
        assert_eq!(
            html_escape(r#"<a href="x">'&'</a>"#),
            "&lt;a href=&quot;x&quot;&gt;&#39;&amp;&#39;&lt;/a&gt;"
        );
        assert_eq!(html_escape("인증 완료"), "인증 완료");
    }

    #[test]
    fn test_auth_page_escapes_body() {
        let Html(page) = auth_page("t", "<script>alert(1)</script>");
        assert!(!page.contains("<script>"));
        assert!(page.contains("&lt;script&gt;alert(1)&lt;/script&gt;"));
    }
}
