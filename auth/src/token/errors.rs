use thiserror::Error;

use super::claims::Purpose;

/// Error type for token issuance and verification.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TokenError {
    #[error("Failed to encode token: {0}")]
    EncodingFailed(String),

    #[error("Token is malformed: {0}")]
    Malformed(String),

    #[error("Token signature is invalid")]
    InvalidSignature,

    #[error("Token is expired")]
    Expired,

    #[error("Token purpose mismatch: expected {expected}, got {actual}")]
    PurposeMismatch { expected: Purpose, actual: Purpose },
}
