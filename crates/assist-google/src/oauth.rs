//! OAuth client secrets and the token endpoint.

use std::path::Path;
use std::time::Duration;

use assist_core::config::GoogleConfig;
use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use crate::error::AuthError;

/// OAuth client id and secret from the Cloud Console client-secrets file.
#[derive(Debug, Clone, PartialEq)]
pub struct ClientSecrets {
    pub client_id: String,
    pub client_secret: String,
}

#[derive(Deserialize)]
struct SecretsFile {
    web: Option<SecretsSection>,
    installed: Option<SecretsSection>,
}

#[derive(Deserialize)]
struct SecretsSection {
    client_id: String,
    client_secret: String,
}

impl ClientSecrets {
    pub fn load(path: &Path) -> Result<Self, AuthError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| AuthError::ClientSecrets(format!("{}: {}", path.display(), e)))?;
        Self::parse(&content)
    }

    /// Parse a client-secrets document. Either the `web` or the `installed`
    /// section is accepted, `web` first.
    pub fn parse(content: &str) -> Result<Self, AuthError> {
        let file: SecretsFile =
            serde_json::from_str(content).map_err(|e| AuthError::ClientSecrets(e.to_string()))?;
        let section = file
            .web
            .or(file.installed)
            .ok_or_else(|| AuthError::ClientSecrets("no `web` or `installed` section".into()))?;
        Ok(Self {
            client_id: section.client_id,
            client_secret: section.client_secret,
        })
    }
}

/// Successful token endpoint response.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    pub expires_in: i64,
    /// Space-separated granted scopes.
    #[serde(default)]
    pub scope: Option<String>,
}

impl TokenResponse {
    pub fn granted_scopes(&self) -> Option<Vec<String>> {
        self.scope
            .as_ref()
            .map(|s| s.split_whitespace().map(str::to_string).collect())
    }
}

/// The OAuth token endpoint: refresh and authorization-code exchange.
#[async_trait]
pub trait TokenEndpoint: Send + Sync {
    async fn refresh(&self, refresh_token: &str) -> Result<TokenResponse, AuthError>;

    async fn exchange_code(&self, code: &str) -> Result<TokenResponse, AuthError>;
}

/// Google's token endpoint over HTTPS.
pub struct GoogleTokenEndpoint {
    client: reqwest::Client,
    token_uri: String,
    redirect_uri: String,
    secrets: ClientSecrets,
}

impl GoogleTokenEndpoint {
    pub fn new(config: &GoogleConfig, secrets: ClientSecrets) -> Result<Self, AuthError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| AuthError::Exchange(e.to_string()))?;
        Ok(Self {
            client,
            token_uri: config.token_uri.clone(),
            redirect_uri: config.redirect_uri.clone(),
            secrets,
        })
    }

    async fn post_form(&self, form: &[(&str, &str)]) -> Result<TokenResponse, String> {
        let response = self
            .client
            .post(&self.token_uri)
            .form(form)
            .send()
            .await
            .map_err(|e| e.to_string())?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(format!("{}: {}", status, body));
        }
        response
            .json::<TokenResponse>()
            .await
            .map_err(|e| e.to_string())
    }
}

#[async_trait]
impl TokenEndpoint for GoogleTokenEndpoint {
    async fn refresh(&self, refresh_token: &str) -> Result<TokenResponse, AuthError> {
        debug!("Refreshing Google access token");
        self.post_form(&[
            ("client_id", self.secrets.client_id.as_str()),
            ("client_secret", self.secrets.client_secret.as_str()),
            ("refresh_token", refresh_token),
            ("grant_type", "refresh_token"),
        ])
        .await
        .map_err(AuthError::Refresh)
    }

    async fn exchange_code(&self, code: &str) -> Result<TokenResponse, AuthError> {
        debug!("Exchanging authorization code");
        self.post_form(&[
            ("code", code),
            ("client_id", self.secrets.client_id.as_str()),
            ("client_secret", self.secrets.client_secret.as_str()),
            ("redirect_uri", self.redirect_uri.as_str()),
            ("grant_type", "authorization_code"),
        ])
        .await
        .map_err(AuthError::Exchange)
    }
}

/// Build the consent URL for the authorization-code flow.
pub fn consent_url(
    auth_uri: &str,
    client_id: &str,
    redirect_uri: &str,
    scopes: &[&str],
    state: &str,
) -> String {
    format!(
        "{}?client_id={}&redirect_uri={}&response_type=code&scope={}&access_type=offline&include_granted_scopes=true&prompt=consent&state={}",
        auth_uri,
        urlencoding::encode(client_id),
        urlencoding::encode(redirect_uri),
        urlencoding::encode(&scopes.join(" ")),
        urlencoding::encode(state),
    )
}
