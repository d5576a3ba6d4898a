//! Authentication errors.

use assist_core::error::AssistError;

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// No usable credential; the user must run the authorization flow.
    #[error("Google authorization required")]
    AuthRequired,
    #[error("token refresh failed: {0}")]
    Refresh(String),
    #[error("code exchange failed: {0}")]
    Exchange(String),
    #[error("unknown or expired authorization state")]
    InvalidState,
    #[error("client secrets unavailable: {0}")]
    ClientSecrets(String),
    #[error("token store error: {0}")]
    Store(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<serde_json::Error> for AuthError {
    fn from(err: serde_json::Error) -> Self {
        AuthError::Store(err.to_string())
    }
}

impl From<AuthError> for AssistError {
    fn from(err: AuthError) -> Self {
        AssistError::Auth(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_error_display() {
        assert_eq!(
            AuthError::AuthRequired.to_string(),
            "Google authorization required"
        );
        assert_eq!(
            AuthError::Refresh("invalid_grant".into()).to_string(),
            "token refresh failed: invalid_grant"
        );
        assert_eq!(
            AuthError::InvalidState.to_string(),
            "unknown or expired authorization state"
        );
    }

    #[test]
    fn test_io_error_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err: AuthError = io.into();
        assert!(matches!(err, AuthError::Io(_)));
    }

    #[test]
    fn test_into_assist_error() {
        let err: AssistError = AuthError::AuthRequired.into();
        assert!(matches!(err, AssistError::Auth(_)));
    }
}
