use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use reqwest::header::AUTHORIZATION;
use reqwest::StatusCode;
use serde_json::Value;
use uuid::Uuid;

use super::oauth1::authorization_header;
use super::oauth1::OAuth1Credentials;
use crate::config::ProviderConfig;
use crate::domain::social::errors::SocialAuthError;
use crate::domain::social::models::SocialCredentials;
use crate::domain::social::models::SocialIdentity;
use crate::domain::social::ports::SocialAuthClient;

/// Verifies provider credentials by fetching the caller's profile.
pub struct HttpSocialAuthClient {
    client: reqwest::Client,
    providers: HashMap<String, ProviderConfig>,
}

impl HttpSocialAuthClient {
    pub fn new(providers: HashMap<String, ProviderConfig>) -> Result<Self, SocialAuthError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| SocialAuthError::Transport(e.to_string()))?;

        let providers: HashMap<String, ProviderConfig> = providers
            .into_iter()
            .map(|(name, provider)| (name.to_lowercase(), provider))
            .collect();

        tracing::info!(
            providers = ?providers.keys().collect::<Vec<_>>(),
            "Social auth client initialized"
        );

        Ok(Self { client, providers })
    }

    fn authorization(
        provider: &ProviderConfig,
        credentials: &SocialCredentials,
    ) -> Result<String, SocialAuthError> {
        match credentials {
            SocialCredentials::OAuth2 { token } => Ok(format!("Bearer {}", token)),
            SocialCredentials::OAuth1 { token, secret } => {
                let (Some(consumer_key), Some(consumer_secret)) =
                    (&provider.consumer_key, &provider.consumer_secret)
                else {
                    return Err(SocialAuthError::Transport(
                        "OAuth1 provider is missing consumer credentials".to_string(),
                    ));
                };

                let credentials = OAuth1Credentials {
                    consumer_key,
                    consumer_secret,
                    token,
                    token_secret: secret,
                };
                authorization_header(
                    "GET",
                    &provider.profile_url,
                    &credentials,
                    &Uuid::new_v4().simple().to_string(),
                    Utc::now().timestamp(),
                )
                .map_err(|e| SocialAuthError::Transport(e.to_string()))
            }
        }
    }
}

#[async_trait]
impl SocialAuthClient for HttpSocialAuthClient {
    async fn fetch_identity(
        &self,
        provider: &str,
        credentials: &SocialCredentials,
    ) -> Result<SocialIdentity, SocialAuthError> {
        let config = self
            .providers
            .get(provider)
            .ok_or_else(|| SocialAuthError::UnsupportedProvider(provider.to_string()))?;

        if config.kind != credentials.kind() {
            return Err(SocialAuthError::UnsupportedProvider(format!(
                "{} does not accept {:?} credentials",
                provider,
                credentials.kind()
            )));
        }

        let response = self
            .client
            .get(&config.profile_url)
            .header(AUTHORIZATION, Self::authorization(config, credentials)?)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| SocialAuthError::Transport(e.to_string()))?;

        let status = response.status();
        match status {
            StatusCode::BAD_REQUEST | StatusCode::UNAUTHORIZED => {
                return Err(SocialAuthError::InvalidCredentials(format!(
                    "{} rejected the access token",
                    provider
                )))
            }
            StatusCode::FORBIDDEN => {
                return Err(SocialAuthError::Forbidden(format!(
                    "{} refused access to the profile",
                    provider
                )))
            }
            s if !s.is_success() => {
                return Err(SocialAuthError::Transport(format!(
                    "{} responded with status {}",
                    provider, s
                )))
            }
            _ => {}
        }

        let profile: Value = response
            .json()
            .await
            .map_err(|e| SocialAuthError::Transport(e.to_string()))?;

        identity_from_profile(provider, &profile)
    }
}

/// Extract an identity from a provider profile document.
///
/// Providers disagree on field names, so the common spellings are tried in order.
fn identity_from_profile(provider: &str, profile: &Value) -> Result<SocialIdentity, SocialAuthError> {
    let uid = ["id_str", "id", "sub", "user_id"]
        .iter()
        .find_map(|key| match profile.get(*key) {
            Some(Value::String(s)) if !s.is_empty() => Some(s.clone()),
            Some(Value::Number(n)) => Some(n.to_string()),
            _ => None,
        })
        .ok_or_else(|| {
            SocialAuthError::InvalidCredentials(format!("{} profile has no user id", provider))
        })?;

    let string_field = |keys: &[&str]| {
        keys.iter()
            .find_map(|key| profile.get(*key).and_then(Value::as_str))
            .filter(|s| !s.trim().is_empty())
            .map(str::to_string)
    };

    Ok(SocialIdentity {
        provider: provider.to_string(),
        uid,
        email: string_field(&["email"]),
        username: string_field(&["username", "screen_name", "login", "name"]),
    })
}
