use auth::TokenError;
use thiserror::Error;

use crate::domain::social::errors::SocialAuthError;

/// Error for UserId parsing failures
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum UserIdError {
    #[error("Invalid UUID format: {0}")]
    InvalidFormat(String),
}

/// Error for Username validation failures
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum UsernameError {
    #[error("Username too short: minimum {min} characters, got {actual}")]
    TooShort { min: usize, actual: usize },

    #[error("Username too long: maximum {max} characters, got {actual}")]
    TooLong { max: usize, actual: usize },

    #[error(
        "Username contains invalid characters (only alphanumeric, underscore, and hyphen allowed)"
    )]
    InvalidCharacters,
}

/// Error for EmailAddress validation failures
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum EmailError {
    #[error("Invalid email format: {0}")]
    InvalidFormat(String),
}

/// Error for password policy violations
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PasswordPolicyError {
    #[error("Password too short: minimum {min} characters")]
    TooShort { min: usize },

    #[error("Password too long: maximum {max} characters")]
    TooLong { max: usize },

    #[error("Password must contain at least one letter")]
    MissingLetter,

    #[error("Password must contain at least one digit")]
    MissingDigit,
}

/// Error for outbound email delivery
#[derive(Debug, Clone, Error)]
pub enum MailerError {
    #[error("Failed to build email request: {0}")]
    InvalidMessage(String),

    #[error("Mail provider rejected the message (status {status}): {body}")]
    Rejected { status: u16, body: String },

    #[error("Connection to mail provider failed: {0}")]
    ConnectionFailed(String),
}

/// Top-level error for all account operations
#[derive(Debug, Clone, Error)]
pub enum AccountError {
    // Value object validation errors (automatically converted via #[from])
    #[error("Invalid username: {0}")]
    InvalidUsername(#[from] UsernameError),

    #[error("Invalid email: {0}")]
    InvalidEmail(#[from] EmailError),

    #[error("Invalid password: {0}")]
    InvalidPassword(#[from] PasswordPolicyError),

    #[error("Username already exists: {0}")]
    UsernameAlreadyExists(String),

    #[error("Email already exists: {0}")]
    EmailAlreadyExists(String),

    #[error("Please provide the '{0}' field")]
    MissingField(&'static str),

    // Credential and token errors
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Token is malformed")]
    MalformedToken,

    #[error("Token signature is invalid")]
    InvalidSignature,

    #[error("Token is expired")]
    Expired,

    #[error("Token is not valid for this operation")]
    PurposeMismatch,

    #[error("Your new password can't be the same as your old password")]
    SamePassword,

    #[error("No account is registered with email: {0}")]
    UnknownEmail(String),

    #[error("Please activate your account to continue")]
    NotActivated,

    #[error("User not found: {0}")]
    NotFound(String),

    // Social sign-in errors
    #[error("Unsupported social provider: {0}")]
    ProviderError(String),

    #[error("Invalid social credentials: {0}")]
    CredentialError(String),

    #[error("Social authentication forbidden: {0}")]
    Forbidden(String),

    // Infrastructure errors
    #[error("Email delivery failed: {0}")]
    MailDelivery(#[from] MailerError),

    #[error("Password error: {0}")]
    Password(#[from] auth::PasswordError),

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Unknown error: {0}")]
    Unknown(String),
}

impl AccountError {
    /// Machine-readable reason code exposed to API clients.
    ///
    /// All token failures share one code so clients cannot tell a forged
    /// token from an expired one.
    pub fn reason(&self) -> &'static str {
        match self {
            AccountError::InvalidUsername(_)
            | AccountError::InvalidEmail(_)
            | AccountError::InvalidPassword(_)
            | AccountError::UsernameAlreadyExists(_)
            | AccountError::EmailAlreadyExists(_) => "validation_error",
            AccountError::MissingField(_) => "missing_field",
            AccountError::InvalidCredentials => "invalid_credentials",
            AccountError::MalformedToken
            | AccountError::InvalidSignature
            | AccountError::Expired
            | AccountError::PurposeMismatch => "invalid_token",
            AccountError::SamePassword => "same_password",
            AccountError::UnknownEmail(_) => "unknown_email",
            AccountError::NotActivated => "not_activated",
            AccountError::NotFound(_) => "not_found",
            AccountError::ProviderError(_) => "provider_error",
            AccountError::CredentialError(_) => "credential_error",
            AccountError::Forbidden(_) => "forbidden",
            AccountError::MailDelivery(_) => "mail_delivery_failed",
            AccountError::Password(_) | AccountError::DatabaseError(_) | AccountError::Unknown(_) => {
                "internal_error"
            }
        }
    }
}

impl From<TokenError> for AccountError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::Malformed(_) => AccountError::MalformedToken,
            TokenError::InvalidSignature => AccountError::InvalidSignature,
            TokenError::Expired => AccountError::Expired,
            TokenError::PurposeMismatch { .. } => AccountError::PurposeMismatch,
            TokenError::EncodingFailed(msg) => AccountError::Unknown(msg),
        }
    }
}

impl From<SocialAuthError> for AccountError {
    fn from(err: SocialAuthError) -> Self {
        match err {
            SocialAuthError::UnsupportedProvider(provider) => AccountError::ProviderError(provider),
            SocialAuthError::InvalidCredentials(msg) | SocialAuthError::Transport(msg) => {
                AccountError::CredentialError(msg)
            }
            SocialAuthError::Forbidden(msg) => AccountError::Forbidden(msg),
        }
    }
}
