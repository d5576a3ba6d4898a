//! Credential manager: one cached token, refreshed under a single lock.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration as StdDuration, Instant};

use assist_core::config::GoogleConfig;
use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::error::AuthError;
use crate::oauth::{consent_url, ClientSecrets, GoogleTokenEndpoint, TokenEndpoint, TokenResponse};
use crate::DEFAULT_SCOPES;

/// Tokens expiring within this window are refreshed before use.
const EXPIRY_MARGIN_SECS: i64 = 60;

/// How long an issued OAuth `state` stays redeemable.
const STATE_TTL: StdDuration = StdDuration::from_secs(10 * 60);

/// Upper bound on outstanding `state` values; the oldest is evicted first.
const MAX_PENDING_STATES: usize = 32;

/// Persisted OAuth token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredToken {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    pub expires_at: DateTime<Utc>,
    #[serde(default)]
    pub scopes: Vec<String>,
}

impl StoredToken {
    pub fn from_response(
        response: TokenResponse,
        previous_refresh: Option<String>,
        previous_scopes: Vec<String>,
        now: DateTime<Utc>,
    ) -> Self {
        let scopes = response.granted_scopes().unwrap_or(previous_scopes);
        Self {
            access_token: response.access_token,
            // Google omits the refresh token on refresh responses.
            refresh_token: response.refresh_token.or(previous_refresh),
            expires_at: now + Duration::seconds(response.expires_in),
            scopes,
        }
    }

    pub fn needs_refresh(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now + Duration::seconds(EXPIRY_MARGIN_SECS)
    }

    pub fn covers(&self, scopes: &[&str]) -> bool {
        scopes.iter().all(|s| self.scopes.iter().any(|have| have == s))
    }
}

/// Bearer credential handed to API adapters.
#[derive(Debug, Clone, PartialEq)]
pub struct Credential {
    pub access_token: String,
    pub expires_at: DateTime<Utc>,
}

impl From<&StoredToken> for Credential {
    fn from(token: &StoredToken) -> Self {
        Self {
            access_token: token.access_token.clone(),
            expires_at: token.expires_at,
        }
    }
}

/// Persistence for the single authorized-user token.
pub trait TokenStore: Send + Sync {
    fn load(&self) -> Result<Option<StoredToken>, AuthError>;
    fn save(&self, token: &StoredToken) -> Result<(), AuthError>;
}

/// JSON token file.
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl TokenStore for FileTokenStore {
    fn load(&self) -> Result<Option<StoredToken>, AuthError> {
        if !self.path.exists() {
            return Ok(None);
        }
        let content = std::fs::read_to_string(&self.path)?;
        let token = serde_json::from_str(&content)?;
        Ok(Some(token))
    }

    fn save(&self, token: &StoredToken) -> Result<(), AuthError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let content = serde_json::to_string_pretty(token)?;
        std::fs::write(&self.path, content)?;
        Ok(())
    }
}

#[derive(Default)]
struct CachedToken {
    loaded: bool,
    token: Option<StoredToken>,
}

/// Owns the OAuth token for the process.
///
/// The cached token, the refresh, and the token-file write all happen under
/// one async mutex, so concurrent callers never refresh twice.
pub struct CredentialManager {
    store: Arc<dyn TokenStore>,
    endpoint: Option<Arc<dyn TokenEndpoint>>,
    client_id: Option<String>,
    auth_uri: String,
    redirect_uri: String,
    cached: Mutex<CachedToken>,
    pending_states: std::sync::Mutex<HashMap<String, Instant>>,
    state_ttl: StdDuration,
}

impl CredentialManager {
    pub fn new(
        store: Arc<dyn TokenStore>,
        endpoint: Option<Arc<dyn TokenEndpoint>>,
        client_id: Option<String>,
        config: &GoogleConfig,
    ) -> Self {
        Self {
            store,
            endpoint,
            client_id,
            auth_uri: config.auth_uri.clone(),
            redirect_uri: config.redirect_uri.clone(),
            cached: Mutex::new(CachedToken::default()),
            pending_states: std::sync::Mutex::new(HashMap::new()),
            state_ttl: STATE_TTL,
        }
    }

    /// Override how long an issued `state` stays redeemable.
    pub fn with_state_ttl(mut self, ttl: StdDuration) -> Self {
        self.state_ttl = ttl;
        self
    }

    /// Build from configuration. Unreadable client secrets leave the manager
    /// usable with an existing valid token but unable to refresh or authorize.
    pub fn from_config(config: &GoogleConfig) -> Self {
        let store: Arc<dyn TokenStore> = Arc::new(FileTokenStore::new(&config.token_path));
        let secrets = ClientSecrets::load(Path::new(&config.credentials_path));

        match secrets.and_then(|s| {
            let client_id = s.client_id.clone();
            GoogleTokenEndpoint::new(config, s).map(|ep| (client_id, ep))
        }) {
            Ok((client_id, endpoint)) => {
                Self::new(store, Some(Arc::new(endpoint)), Some(client_id), config)
            }
            Err(e) => {
                warn!(error = %e, "Google client secrets not loaded; authorization disabled");
                Self::new(store, None, None, config)
            }
        }
    }

    /// Return a credential covering `scopes`, refreshing it if it is expired
    /// or about to expire.
    pub async fn get_valid_credential(&self, scopes: &[&str]) -> Result<Credential, AuthError> {
        let mut cached = self.cached.lock().await;
        if !cached.loaded {
            cached.token = self.load_stored().await?;
            cached.loaded = true;
        }

        let token = cached.token.as_ref().ok_or(AuthError::AuthRequired)?;
        if !token.covers(scopes) {
            debug!(?scopes, "Stored token does not cover requested scopes");
            return Err(AuthError::AuthRequired);
        }

        let now = Utc::now();
        if !token.needs_refresh(now) {
            return Ok(Credential::from(token));
        }

        let refresh_token = token.refresh_token.clone().ok_or(AuthError::AuthRequired)?;
        let endpoint = self.endpoint.as_ref().ok_or(AuthError::AuthRequired)?;
        let previous_scopes = token.scopes.clone();

        let response = endpoint.refresh(&refresh_token).await?;
        let refreshed =
            StoredToken::from_response(response, Some(refresh_token), previous_scopes, Utc::now());
        self.save_stored(&refreshed).await?;
        info!(expires_at = %refreshed.expires_at, "Google access token refreshed");

        let credential = Credential::from(&refreshed);
        cached.token = Some(refreshed);
        Ok(credential)
    }

    /// Whether a token exists that can be used or refreshed.
    pub async fn is_authorized(&self) -> bool {
        let mut cached = self.cached.lock().await;
        self.authorized(&mut cached).await
    }

    /// Like [`is_authorized`](Self::is_authorized) but never waits on an
    /// in-flight refresh; `None` while the token lock is held.
    pub async fn authorization_status(&self) -> Option<bool> {
        let mut cached = self.cached.try_lock().ok()?;
        Some(self.authorized(&mut cached).await)
    }

    async fn authorized(&self, cached: &mut CachedToken) -> bool {
        if !cached.loaded {
            match self.load_stored().await {
                Ok(token) => cached.token = token,
                Err(e) => {
                    warn!(error = %e, "Failed to read token store");
                    return false;
                }
            }
            cached.loaded = true;
        }
        match &cached.token {
            Some(token) => token.refresh_token.is_some() || !token.needs_refresh(Utc::now()),
            None => false,
        }
    }

    async fn load_stored(&self) -> Result<Option<StoredToken>, AuthError> {
        let store = Arc::clone(&self.store);
        tokio::task::spawn_blocking(move || store.load())
            .await
            .map_err(|e| AuthError::Store(format!("token store task failed: {e}")))?
    }

    async fn save_stored(&self, token: &StoredToken) -> Result<(), AuthError> {
        let store = Arc::clone(&self.store);
        let token = token.clone();
        tokio::task::spawn_blocking(move || store.save(&token))
            .await
            .map_err(|e| AuthError::Store(format!("token store task failed: {e}")))?
    }

    /// Start the authorization-code flow: returns the consent URL and
    /// remembers its `state` value.
    pub fn authorization_url(&self) -> Result<String, AuthError> {
        let client_id = self
            .client_id
            .as_deref()
            .ok_or_else(|| AuthError::ClientSecrets("client id not configured".into()))?;

        let state = generate_state();
        let url = consent_url(
            &self.auth_uri,
            client_id,
            &self.redirect_uri,
            &DEFAULT_SCOPES,
            &state,
        );
        self.remember_state(state, Instant::now())?;
        Ok(url)
    }

    /// Finish the authorization-code flow. The `state` must come from a prior
    /// `authorization_url` call and is consumed.
    pub async fn complete_authorization(&self, code: &str, state: &str) -> Result<(), AuthError> {
        let issued = self
            .pending_states
            .lock()
            .map_err(|_| AuthError::Store("state lock poisoned".into()))?
            .remove(state);
        match issued {
            Some(at) if at.elapsed() < self.state_ttl => {}
            _ => return Err(AuthError::InvalidState),
        }

        let endpoint = self
            .endpoint
            .as_ref()
            .ok_or_else(|| AuthError::ClientSecrets("token endpoint not configured".into()))?;

        let mut cached = self.cached.lock().await;
        let response = endpoint.exchange_code(code).await?;
        let requested = DEFAULT_SCOPES.iter().map(|s| s.to_string()).collect();
        let previous_refresh = cached.token.as_ref().and_then(|t| t.refresh_token.clone());
        let token = StoredToken::from_response(response, previous_refresh, requested, Utc::now());
        self.save_stored(&token).await?;
        info!("Google authorization completed");

        cached.token = Some(token);
        cached.loaded = true;
        Ok(())
    }
}

impl CredentialManager {
    fn remember_state(&self, state: String, now: Instant) -> Result<(), AuthError> {
        let mut pending = self
            .pending_states
            .lock()
            .map_err(|_| AuthError::Store("state lock poisoned".into()))?;
        let ttl = self.state_ttl;
        pending.retain(|_, issued| now.saturating_duration_since(*issued) < ttl);
        while pending.len() >= MAX_PENDING_STATES {
            let Some(oldest) = pending
                .iter()
                .min_by_key(|(_, issued)| **issued)
                .map(|(s, _)| s.clone())
            else {
                break;
            };
            pending.remove(&oldest);
        }
        pending.insert(state, now);
        Ok(())
    }

    #[cfg(test)]
    fn pending_state_count(&self) -> usize {
        self.pending_states.lock().map(|p| p.len()).unwrap_or(0)
    }
}

fn generate_state() -> String {
    let mut rng = rand::rng();
    let bytes: [u8; 16] = rng.random();
    hex::encode(bytes)
}
