pub mod claims;
pub mod errors;
pub mod verifier;

pub use claims::Purpose;
pub use claims::TokenClaims;
pub use errors::TokenError;
pub use verifier::IssuedToken;
pub use verifier::TokenAuthenticator;
pub use verifier::VerifiedToken;
