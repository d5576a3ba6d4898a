//! Application state shared across all route handlers.

use std::sync::Arc;
use std::time::Instant;

use assist_chat::ChatOrchestrator;
use assist_core::config::AssistConfig;
use assist_google::CredentialManager;

/// Shared application state, built once at startup.
///
/// All fields use `Arc` for cheap cloning across handler tasks. Nothing here
/// is mutated after construction.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AssistConfig>,
    pub orchestrator: Arc<ChatOrchestrator>,
    pub credentials: Arc<CredentialManager>,
    /// Chunks in the loaded vector index, reported by `/health`.
    pub indexed_chunks: usize,
    /// Server start time for uptime calculation.
    pub start_time: Instant,
}

impl AppState {
    pub fn new(
        config: AssistConfig,
        orchestrator: ChatOrchestrator,
        credentials: Arc<CredentialManager>,
        indexed_chunks: usize,
    ) -> Self {
        Self {
            config: Arc::new(config),
            orchestrator: Arc::new(orchestrator),
            credentials,
            indexed_chunks,
            start_time: Instant::now(),
        }
    }
}
