use std::collections::HashMap;

use serde::Deserialize;

use crate::domain::user::models::EmailAddress;
use crate::domain::user::models::UserId;
use crate::user::errors::AccountError;

/// OAuth protocol generation a provider speaks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    OAuth1,
    OAuth2,
}

/// Access credentials presented by the client, shaped by the provider kind.
#[derive(Clone, PartialEq, Eq)]
pub enum SocialCredentials {
    OAuth1 { token: String, secret: String },
    OAuth2 { token: String },
}

impl SocialCredentials {
    /// Shape raw request fields for a provider of the given kind.
    ///
    /// # Errors
    /// * `MissingField` - Token absent, or secret absent for OAuth1
    pub fn for_kind(
        kind: ProviderKind,
        access_token: Option<String>,
        access_token_secret: Option<String>,
    ) -> Result<Self, AccountError> {
        let token = non_empty(access_token).ok_or(AccountError::MissingField("access_token"))?;

        match kind {
            ProviderKind::OAuth2 => Ok(SocialCredentials::OAuth2 { token }),
            ProviderKind::OAuth1 => {
                let secret = non_empty(access_token_secret)
                    .ok_or(AccountError::MissingField("access_token_secret"))?;
                Ok(SocialCredentials::OAuth1 { token, secret })
            }
        }
    }

    pub fn kind(&self) -> ProviderKind {
        match self {
            SocialCredentials::OAuth1 { .. } => ProviderKind::OAuth1,
            SocialCredentials::OAuth2 { .. } => ProviderKind::OAuth2,
        }
    }
}

impl std::fmt::Debug for SocialCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SocialCredentials::{:?}(**redacted**)", self.kind())
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Third-party identity after the provider has vouched for the credentials.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SocialIdentity {
    pub provider: String,
    pub uid: String,
    pub email: Option<String>,
    pub username: Option<String>,
}

/// Request to sign in (or link an account) through a social provider.
#[derive(Debug)]
pub struct SocialSignInCommand {
    pub provider: String,
    pub access_token: Option<String>,
    pub access_token_secret: Option<String>,
    /// Principal already signed in, for account linking
    pub current_user: Option<UserId>,
}

/// Which providers are enabled and which identities they may admit.
#[derive(Debug, Clone, Default)]
pub struct SocialPolicy {
    providers: HashMap<String, ProviderKind>,
    whitelisted_domains: Vec<String>,
}

impl SocialPolicy {
    pub fn new(providers: HashMap<String, ProviderKind>, whitelisted_domains: Vec<String>) -> Self {
        Self {
            providers,
            whitelisted_domains: whitelisted_domains
                .into_iter()
                .map(|d| d.trim().to_lowercase())
                .collect(),
        }
    }

    pub fn provider_kind(&self, provider: &str) -> Option<ProviderKind> {
        self.providers.get(provider).copied()
    }

    /// An empty whitelist admits every domain.
    pub fn admits(&self, email: Option<&EmailAddress>) -> bool {
        if self.whitelisted_domains.is_empty() {
            return true;
        }
        email.is_some_and(|email| self.whitelisted_domains.iter().any(|d| d == email.domain()))
    }
}
