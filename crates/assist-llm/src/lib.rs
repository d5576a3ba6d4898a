//! Language model backend for the assistant.
//!
//! Defines the `LanguageModel` trait the response chains call, a Gemini
//! `generateContent` client implementing it, and the response-shape
//! normalization applied at the client boundary.

pub mod error;
pub mod gemini;
pub mod normalize;
pub mod provider;

pub use error::LlmError;
pub use gemini::GeminiClient;
pub use provider::{LanguageModel, PromptRequest};
