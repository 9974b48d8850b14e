use chrono::DateTime;
use chrono::Duration;
use chrono::Utc;
use jsonwebtoken::decode;
use jsonwebtoken::encode;
use jsonwebtoken::errors::Error as JwtLibraryError;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::Algorithm;
use jsonwebtoken::DecodingKey;
use jsonwebtoken::EncodingKey;
use jsonwebtoken::Header;
use jsonwebtoken::Validation;

use super::claims::Purpose;
use super::claims::TokenClaims;
use super::errors::TokenError;

/// A freshly signed token together with its expiry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedToken {
    pub token: String,
    pub purpose: Purpose,
    pub expires_at: DateTime<Utc>,
}

/// The trusted content of a token that passed verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedToken {
    pub subject: String,
    pub purpose: Purpose,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

/// Issues and verifies signed, stateless tokens.
///
/// A token binds a subject, a [`Purpose`] and an expiry under an HS256
/// signature. Nothing is stored server side: verification reconstructs
/// everything from the token itself and the configured secrets.
///
/// Verification order is fixed: structure, then signature, then expiry.
/// Claimed fields are only read after the signature has been checked.
///
/// Secret rotation is supported through [`TokenAuthenticator::with_previous_secrets`]:
/// retired secrets still verify tokens until they are dropped from the
/// configuration, but new tokens are always signed with the current secret.
pub struct TokenAuthenticator {
    encoding_key: EncodingKey,
    decoding_keys: Vec<DecodingKey>,
    validation: Validation,
}

impl TokenAuthenticator {
    /// Create an authenticator signing with `secret`.
    ///
    /// # Security Notes
    /// - The secret should be at least 256 bits (32 bytes) for HS256
    /// - Load it from configuration or a vault, never from code
    pub fn new(secret: &[u8]) -> Self {
        let algorithm = Algorithm::HS256;

        let mut validation = Validation::new(algorithm);
        // Expiry is checked against an explicit clock in `verify_at`.
        validation.validate_exp = false;
        validation.required_spec_claims.clear();
        validation.leeway = 0;

        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_keys: vec![DecodingKey::from_secret(secret)],
            validation,
        }
    }

    /// Accept tokens signed with retired secrets during a grace period.
    pub fn with_previous_secrets<I, S>(mut self, secrets: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<[u8]>,
    {
        self.decoding_keys.extend(
            secrets
                .into_iter()
                .map(|secret| DecodingKey::from_secret(secret.as_ref())),
        );
        self
    }

    /// Issue a token for `subject` valid for `ttl` from now.
    ///
    /// # Errors
    /// * `EncodingFailed` - Token encoding failed or `ttl` overflows the clock
    pub fn issue(
        &self,
        subject: impl ToString,
        purpose: Purpose,
        ttl: Duration,
    ) -> Result<IssuedToken, TokenError> {
        self.issue_at(subject, purpose, ttl, Utc::now())
    }

    /// Issue a token as if the current time were `now`.
    pub fn issue_at(
        &self,
        subject: impl ToString,
        purpose: Purpose,
        ttl: Duration,
        now: DateTime<Utc>,
    ) -> Result<IssuedToken, TokenError> {
        let claims = TokenClaims::new(subject, purpose, now, ttl)?;
        let header = Header::new(self.validation.algorithms[0]);

        let token = encode(&header, &claims, &self.encoding_key)
            .map_err(|e| TokenError::EncodingFailed(e.to_string()))?;

        Ok(IssuedToken {
            token,
            purpose,
            expires_at: claims.expires_at(),
        })
    }

    /// Verify a presented token against the current time.
    ///
    /// The caller must still check that the returned purpose is the one its
    /// endpoint expects, or use [`TokenAuthenticator::verify_for`].
    ///
    /// # Errors
    /// * `Malformed` - Token cannot be parsed into its claims
    /// * `InvalidSignature` - Signature does not match any configured secret
    /// * `Expired` - Token expiry has passed
    pub fn verify(&self, token: &str) -> Result<VerifiedToken, TokenError> {
        self.verify_at(token, Utc::now())
    }

    /// Verify a presented token as if the current time were `now`.
    pub fn verify_at(&self, token: &str, now: DateTime<Utc>) -> Result<VerifiedToken, TokenError> {
        let claims = self.decode_signed(token.trim())?;

        if claims.is_expired(now.timestamp()) {
            return Err(TokenError::Expired);
        }

        Ok(VerifiedToken {
            issued_at: claims.issued_at(),
            expires_at: claims.expires_at(),
            subject: claims.sub,
            purpose: claims.purpose,
        })
    }

    /// Verify a token and require a specific purpose.
    ///
    /// # Errors
    /// Everything [`TokenAuthenticator::verify`] returns, plus
    /// * `PurposeMismatch` - Token is valid but meant for another endpoint
    pub fn verify_for(&self, token: &str, expected: Purpose) -> Result<VerifiedToken, TokenError> {
        self.verify_for_at(token, expected, Utc::now())
    }

    pub fn verify_for_at(
        &self,
        token: &str,
        expected: Purpose,
        now: DateTime<Utc>,
    ) -> Result<VerifiedToken, TokenError> {
        let verified = self.verify_at(token, now)?;

        if verified.purpose != expected {
            return Err(TokenError::PurposeMismatch {
                expected,
                actual: verified.purpose,
            });
        }

        Ok(verified)
    }

    fn decode_signed(&self, token: &str) -> Result<TokenClaims, TokenError> {
        for key in &self.decoding_keys {
            match decode::<TokenClaims>(token, key, &self.validation) {
                Ok(data) => return Ok(data.claims),
                Err(e) if matches!(e.kind(), ErrorKind::InvalidSignature) => continue,
                Err(e) => return Err(classify(e)),
            }
        }

        Err(TokenError::InvalidSignature)
    }
}

fn classify(error: JwtLibraryError) -> TokenError {
    match error.kind() {
        ErrorKind::InvalidSignature | ErrorKind::InvalidAlgorithm => TokenError::InvalidSignature,
        ErrorKind::ExpiredSignature => TokenError::Expired,
        _ => TokenError::Malformed(error.to_string()),
    }
}
