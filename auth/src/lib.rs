//! Token and credential core for the account service.
//!
//! Provides the pieces of authentication that need no storage or network:
//! - Signed, stateless, purpose-bound tokens (HS256)
//! - Password hashing (Argon2id)
//! - Login coordination (password check + session token)
//!
//! Principals are looked up by the caller. Nothing here knows whether a user
//! exists or is activated; it only answers whether a token or password is valid.
//!
//! # Examples
//!
//! ## Tokens
//! ```
//! use auth::{Purpose, TokenAuthenticator};
//! use chrono::Duration;
//!
//! let tokens = TokenAuthenticator::new(b"secret_key_at_least_32_bytes_long!");
//! let issued = tokens.issue("42", Purpose::Activation, Duration::hours(24)).unwrap();
//!
//! let verified = tokens.verify_for(&issued.token, Purpose::Activation).unwrap();
//! assert_eq!(verified.subject, "42");
//! ```
//!
//! ## Login
//! ```
//! use auth::{Authenticator, Purpose, TokenAuthenticator};
//! use chrono::Duration;
//!
//! let auth = Authenticator::new(
//!     TokenAuthenticator::new(b"secret_key_at_least_32_bytes_long!"),
//!     Duration::hours(24),
//! );
//!
//! let hash = auth.hash_password("password123").unwrap();
//! let session = auth.login("password123", &hash, "42").unwrap();
//! assert_eq!(session.purpose, Purpose::Session);
//! ```

pub mod authenticator;
pub mod password;
pub mod token;

pub use authenticator::AuthenticationError;
pub use authenticator::Authenticator;
pub use password::PasswordError;
pub use password::PasswordHasher;
pub use token::IssuedToken;
pub use token::Purpose;
pub use token::TokenAuthenticator;
pub use token::TokenClaims;
pub use token::TokenError;
pub use token::VerifiedToken;
