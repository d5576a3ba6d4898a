//! Google Workspace integration: OAuth credentials plus the Gmail and
//! Calendar tool adapters.

pub mod calendar;
pub mod credential;
pub mod error;
pub mod gmail;
pub mod oauth;

pub use calendar::{CalendarClient, CalendarTool};
pub use credential::{Credential, CredentialManager, FileTokenStore, StoredToken, TokenStore};
pub use error::AuthError;
pub use gmail::{GmailClient, MailTool};
pub use oauth::{ClientSecrets, GoogleTokenEndpoint, TokenEndpoint, TokenResponse};

/// Read-only Gmail scope.
pub const GMAIL_READONLY: &str = "https://www.googleapis.com/auth/gmail.readonly";
/// Read-only Calendar scope.
pub const CALENDAR_READONLY: &str = "https://www.googleapis.com/auth/calendar.readonly";

/// Scopes requested during authorization.
pub const DEFAULT_SCOPES: [&str; 2] = [GMAIL_READONLY, CALENDAR_READONLY];
