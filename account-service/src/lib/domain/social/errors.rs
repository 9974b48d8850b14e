use thiserror::Error;

/// Failures reported by the social identity collaborator.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SocialAuthError {
    #[error("Provider is not supported: {0}")]
    UnsupportedProvider(String),

    #[error("Access credentials rejected: {0}")]
    InvalidCredentials(String),

    #[error("Provider refused authentication: {0}")]
    Forbidden(String),

    #[error("Provider request failed: {0}")]
    Transport(String),
}
