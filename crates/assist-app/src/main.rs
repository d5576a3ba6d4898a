//! Assistant binary - composition root.
//!
//! `assist serve` loads the vector index, builds the Gemini model, the Google
//! tools and the chat orchestrator, and starts the axum server.
//! `assist ingest` builds the vector index from a directory of text files.

mod cli;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use assist_api::routes;
use assist_api::state::AppState;
use assist_chat::{ChatOrchestrator, Dispatcher, KeywordRouter};
use assist_core::config::AssistConfig;
use assist_google::{CalendarClient, CredentialManager, GmailClient};
use assist_llm::GeminiClient;
use assist_vector::{GeminiEmbedding, IndexRetriever, Ingestor, TextSplitter, VectorIndex};

use crate::cli::{CliArgs, Command};

type BoxError = Box<dyn std::error::Error>;

async fn serve(config: AssistConfig) -> Result<(), BoxError> {
    let store_dir = PathBuf::from(&config.retrieval.vector_store_path);
    let index = match VectorIndex::load(&store_dir) {
        Ok(index) => Arc::new(index),
        Err(e) => {
            tracing::error!(error = %e, "Cannot start without a vector index");
            return Err(e.into());
        }
    };
    if index.embedding_model() != config.llm.embedding_model {
        tracing::warn!(
            index_model = index.embedding_model(),
            configured = %config.llm.embedding_model,
            "Index was built with a different embedding model; re-run `assist ingest`"
        );
    }
    tracing::info!(chunks = index.len(), path = %store_dir.display(), "Vector index loaded");

    let llm = Arc::new(GeminiClient::new(&config.llm)?);
    let embedder = GeminiEmbedding::new(&config.llm)?;
    let retriever = IndexRetriever::new(Arc::clone(&index), embedder, config.retrieval.top_k);

    let credentials = Arc::new(CredentialManager::from_config(&config.google));
    if !credentials.is_authorized().await {
        tracing::warn!(
            "No Google token found; open http://{}:{}/auth/google to authorize",
            config.server.host,
            config.server.port
        );
    }
    let gmail = GmailClient::new(&config.google, Arc::clone(&credentials))?;
    let calendar = CalendarClient::new(&config.google, Arc::clone(&credentials))?;

    let dispatcher = Dispatcher::new(
        llm,
        Arc::new(gmail),
        Arc::new(calendar),
        Arc::new(retriever),
        config.replies.clone(),
    );
    let orchestrator = ChatOrchestrator::new(
        Box::new(KeywordRouter::from_config(&config.router)),
        dispatcher,
    );

    let indexed_chunks = index.len();
    let state = AppState::new(config.clone(), orchestrator, credentials, indexed_chunks);
    routes::start_server(&config, state).await?;
    Ok(())
}

async fn ingest(config: AssistConfig, source: Option<PathBuf>) -> Result<(), BoxError> {
    let source_dir =
        source.unwrap_or_else(|| PathBuf::from(&config.retrieval.document_source_dir));
    let store_dir = Path::new(&config.retrieval.vector_store_path);

    let embedder = GeminiEmbedding::new(&config.llm)?;
    let splitter = TextSplitter::new(config.retrieval.chunk_size, config.retrieval.chunk_overlap);
    let ingestor = Ingestor::new(embedder, splitter);

    tracing::info!(source = %source_dir.display(), "Ingesting documents");
    let (index, report) = ingestor.ingest_dir(&source_dir).await?;
    if report.documents == 0 {
        tracing::warn!("Nothing to index; existing index left unchanged");
        return Ok(());
    }

    let path = index.save(store_dir)?;
    tracing::info!(
        documents = report.documents,
        chunks = report.chunks,
        path = %path.display(),
        "Vector index written"
    );
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), BoxError> {
    let args = CliArgs::parse();

    // .env is optional.
    let _ = dotenvy::dotenv();

    let config_file = args.resolve_config_path();
    let mut config = AssistConfig::load_or_default(&config_file);
    config.apply_env();
    config.general.log_level = args.resolve_log_level(&config.general.log_level);
    config.server.port = args.resolve_port(config.server.port);

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.general.log_level)),
        )
        .init();

    tracing::info!(
        path = %config_file.display(),
        "Starting assist v{}",
        env!("CARGO_PKG_VERSION")
    );

    match args.command {
        Command::Serve { .. } => serve(config).await,
        Command::Ingest { source } => ingest(config, source).await,
    }
}
