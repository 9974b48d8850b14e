use std::collections::HashMap;
use std::env;

use config::Config as ConfigBuilder;
use config::ConfigError;
use config::Environment;
use config::File;
use serde::Deserialize;

use crate::domain::social::models::ProviderKind;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub database: DatabaseConfig,
    pub server: ServerConfig,
    pub jwt: JwtConfig,
    pub mail: MailConfig,
    #[serde(default)]
    pub social: SocialConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub http_port: u16,
}

#[derive(Debug, Deserialize, Clone)]
pub struct JwtConfig {
    pub secret: String,
    /// Secrets still accepted for verification after a rotation
    #[serde(default)]
    pub previous_secrets: Vec<String>,
    #[serde(default = "default_session_ttl_hours")]
    pub session_ttl_hours: i64,
    #[serde(default = "default_activation_ttl_hours")]
    pub activation_ttl_hours: i64,
    #[serde(default = "default_password_reset_ttl_hours")]
    pub password_reset_ttl_hours: i64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct MailConfig {
    pub api_url: String,
    pub api_key: String,
    pub sender_email: String,
    #[serde(default)]
    pub sender_name: String,
    /// Base URL of this service. Activation links point at its
    /// `GET /api/users/activate/:token` route.
    pub public_base_url: String,
    /// Client page that collects the new password. The reset token is
    /// appended as the last path segment. Without it, reset links address
    /// the `PUT /api/users/password/reset/:token` API route and are not
    /// usable from a browser.
    #[serde(default)]
    pub password_reset_page_url: Option<String>,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct SocialConfig {
    /// Email domains allowed to sign in socially; empty allows all
    #[serde(default)]
    pub whitelisted_domains: Vec<String>,
    #[serde(default)]
    pub providers: HashMap<String, ProviderConfig>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ProviderConfig {
    pub kind: ProviderKind,
    /// Endpoint returning the authenticated profile as JSON
    pub profile_url: String,
    /// OAuth1 only
    pub consumer_key: Option<String>,
    /// OAuth1 only
    pub consumer_secret: Option<String>,
}

fn default_max_connections() -> u32 {
    5
}

/// Upper bound for any token lifetime (ten years).
const MAX_TTL_HOURS: i64 = 24 * 365 * 10;

fn default_session_ttl_hours() -> i64 {
    24
}

fn default_activation_ttl_hours() -> i64 {
    24
}

fn default_password_reset_ttl_hours() -> i64 {
    1
}

impl Config {
    /// Load configuration from files with environment variable overrides
    ///
    /// Priority (highest to lowest):
    /// 1. Environment variables (DATABASE__URL, JWT__SECRET, etc.)
    /// 2. Environment-specific config file (config/{environment}.toml)
    /// 3. Default config file (config/default.toml)
    pub fn load() -> Result<Self, ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let configuration = ConfigBuilder::builder()
            // Start with default configuration
            .add_source(File::with_name("config/default").required(false))
            // Layer on environment-specific configuration
            .add_source(File::with_name(&format!("config/{}", run_mode)).required(false))
            // Layer on environment variables (with __ as separator)
            // Example: JWT__SECRET=... overrides jwt.secret
            .add_source(Environment::with_prefix("").separator("__"))
            .build()?;

        let config: Config = configuration.try_deserialize()?;
        config.validate()?;

        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.jwt.secret.len() < 32 {
            return Err(ConfigError::Message(
                "jwt.secret must be at least 32 bytes".to_string(),
            ));
        }

        let ttls = [
            ("jwt.session_ttl_hours", self.jwt.session_ttl_hours),
            ("jwt.activation_ttl_hours", self.jwt.activation_ttl_hours),
            ("jwt.password_reset_ttl_hours", self.jwt.password_reset_ttl_hours),
        ];
        if let Some((key, _)) = ttls
            .iter()
            .find(|(_, hours)| !(1..=MAX_TTL_HOURS).contains(hours))
        {
            return Err(ConfigError::Message(format!(
                "{} must be between 1 and {}",
                key, MAX_TTL_HOURS
            )));
        }

        for (name, provider) in &self.social.providers {
            if provider.kind == ProviderKind::OAuth1
                && (provider.consumer_key.is_none() || provider.consumer_secret.is_none())
            {
                return Err(ConfigError::Message(format!(
                    "social.providers.{} needs consumer_key and consumer_secret",
                    name
                )));
            }
        }

        Ok(())
    }

    /// Provider name to protocol kind, as the domain policy sees it.
    pub fn provider_kinds(&self) -> HashMap<String, ProviderKind> {
        self.social
            .providers
            .iter()
            .map(|(name, provider)| (name.to_lowercase(), provider.kind))
            .collect()
    }
}
