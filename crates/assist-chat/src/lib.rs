//! Conversational core of the assistant.
//!
//! Classifies each message into a route, runs the matching response chain
//! (general, email, calendar, document QA), and converts any failure into a
//! reply text at the orchestrator boundary.

pub mod chains;
pub mod dispatcher;
pub mod error;
pub mod orchestrator;
pub mod router;
pub mod types;

pub use dispatcher::Dispatcher;
pub use error::ChatError;
pub use orchestrator::{ChatOrchestrator, ChatOutcome};
pub use router::{IntentClassifier, KeywordRouter};
pub use types::{ChatRequest, ChatResponse};
