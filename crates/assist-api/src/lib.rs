//! HTTP boundary for the assistant.
//!
//! Serves `POST /api/chat`, the service banner and health endpoints, and the
//! Google OAuth authorization routes.

pub mod error;
pub mod handlers;
pub mod routes;
pub mod state;

pub use error::ApiError;
pub use routes::{create_router, start_server};
pub use state::AppState;
