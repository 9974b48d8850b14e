use async_trait::async_trait;

use crate::domain::social::errors::SocialAuthError;
use crate::domain::social::models::SocialCredentials;
use crate::domain::social::models::SocialIdentity;

/// Verifies third-party access credentials with the provider.
#[async_trait]
pub trait SocialAuthClient: Send + Sync + 'static {
    /// Resolve provider credentials into a verified identity.
    ///
    /// # Arguments
    /// * `provider` - Configured provider name (e.g. "google", "twitter")
    /// * `credentials` - Access credentials shaped for the provider kind
    ///
    /// # Returns
    /// Identity the provider vouches for
    ///
    /// # Errors
    /// * `UnsupportedProvider` - Provider is not configured on the client
    /// * `InvalidCredentials` - Token invalid or expired
    /// * `Forbidden` - Provider policy refuses the identity
    /// * `Transport` - Provider could not be reached
    async fn fetch_identity(
        &self,
        provider: &str,
        credentials: &SocialCredentials,
    ) -> Result<SocialIdentity, SocialAuthError>;
}
