use std::fmt;

use chrono::DateTime;
use chrono::Duration;
use chrono::TimeZone;
use chrono::Utc;
use serde::Deserialize;
use serde::Serialize;

use super::errors::TokenError;

/// Intended use of a token.
///
/// Tokens are not interchangeable across purposes: an activation token must
/// never open a session and a session token must never reset a password.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Purpose {
    Session,
    Activation,
    PasswordReset,
}

impl Purpose {
    pub fn as_str(&self) -> &'static str {
        match self {
            Purpose::Session => "session",
            Purpose::Activation => "activation",
            Purpose::PasswordReset => "password_reset",
        }
    }
}

impl fmt::Display for Purpose {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Signed payload of every token.
///
/// All fields are required; a token missing any of them is malformed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TokenClaims {
    /// Subject (principal identifier)
    pub sub: String,

    /// What the token may be used for
    pub purpose: Purpose,

    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// Expiration time (Unix timestamp)
    pub exp: i64,
}

impl TokenClaims {
    /// Build claims for `subject` valid from `now` for `ttl`.
    ///
    /// # Errors
    /// * `EncodingFailed` - `now + ttl` is outside the representable range
    pub fn new(
        subject: impl ToString,
        purpose: Purpose,
        now: DateTime<Utc>,
        ttl: Duration,
    ) -> Result<Self, TokenError> {
        let expires_at = now.checked_add_signed(ttl).ok_or_else(|| {
            TokenError::EncodingFailed(format!("token lifetime out of range: {}", ttl))
        })?;

        Ok(Self {
            sub: subject.to_string(),
            purpose,
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
        })
    }

    /// A token is expired once the current time is strictly past `exp`.
    pub fn is_expired(&self, current_timestamp: i64) -> bool {
        self.exp < current_timestamp
    }

    pub fn issued_at(&self) -> DateTime<Utc> {
        timestamp_to_datetime(self.iat)
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        timestamp_to_datetime(self.exp)
    }
}

fn timestamp_to_datetime(timestamp: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(timestamp, 0).single().unwrap_or_default()
}
