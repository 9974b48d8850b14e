use chrono::Duration;

use crate::password::PasswordError;
use crate::password::PasswordHasher;
use crate::token::IssuedToken;
use crate::token::Purpose;
use crate::token::TokenAuthenticator;
use crate::token::TokenError;

/// Credential coordinator combining password verification and token issuance.
///
/// Holds no reference to user storage: callers resolve principals and pass in
/// the stored hash, then resolve the subject of verified tokens themselves.
pub struct Authenticator {
    password_hasher: PasswordHasher,
    tokens: TokenAuthenticator,
    session_ttl: Duration,
}

/// Login operation errors.
#[derive(Debug, thiserror::Error)]
pub enum AuthenticationError {
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Password error: {0}")]
    PasswordError(#[from] PasswordError),

    #[error("Token error: {0}")]
    TokenError(#[from] TokenError),
}

impl Authenticator {
    /// Create an authenticator from an already configured token authenticator.
    ///
    /// # Arguments
    /// * `tokens` - Token issuer/verifier holding the signing secrets
    /// * `session_ttl` - Lifetime of session tokens issued on login
    pub fn new(tokens: TokenAuthenticator, session_ttl: Duration) -> Self {
        Self {
            password_hasher: PasswordHasher::new(),
            tokens,
            session_ttl,
        }
    }

    /// Replace the password hasher (e.g. cheaper parameters in tests).
    pub fn with_password_hasher(mut self, password_hasher: PasswordHasher) -> Self {
        self.password_hasher = password_hasher;
        self
    }

    pub fn tokens(&self) -> &TokenAuthenticator {
        &self.tokens
    }

    pub fn session_ttl(&self) -> Duration {
        self.session_ttl
    }

    /// Hash a password for storage.
    ///
    /// # Errors
    /// * `PasswordError` - Hashing operation failed
    pub fn hash_password(&self, password: &str) -> Result<String, PasswordError> {
        self.password_hasher.hash(password)
    }

    /// Compare a candidate password with a stored hash (constant-time digest comparison).
    ///
    /// # Errors
    /// * `PasswordError` - Stored hash is unreadable
    pub fn password_matches(&self, password: &str, stored_hash: &str) -> Result<bool, PasswordError> {
        self.password_hasher.verify(password, stored_hash)
    }

    /// Verify credentials and issue a session token for `subject`.
    ///
    /// # Errors
    /// * `InvalidCredentials` - Password does not match
    /// * `PasswordError` - Password verification failed
    /// * `TokenError` - Token generation failed
    pub fn login(
        &self,
        password: &str,
        stored_hash: &str,
        subject: impl ToString,
    ) -> Result<IssuedToken, AuthenticationError> {
        if !self.password_hasher.verify(password, stored_hash)? {
            return Err(AuthenticationError::InvalidCredentials);
        }

        Ok(self.issue_session(subject)?)
    }

    /// Issue a session token without password verification.
    ///
    /// Used when the identity was established by other means, such as a
    /// verified social sign-in.
    pub fn issue_session(&self, subject: impl ToString) -> Result<IssuedToken, TokenError> {
        self.tokens.issue(subject, Purpose::Session, self.session_ttl)
    }
}
