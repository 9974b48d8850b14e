use std::collections::HashMap;
use std::sync::Arc;
use std::sync::Mutex;

use account_service::domain::social::errors::SocialAuthError;
use account_service::domain::social::models::ProviderKind;
use account_service::domain::social::models::SocialCredentials;
use account_service::domain::social::models::SocialIdentity;
use account_service::domain::social::models::SocialPolicy;
use account_service::domain::social::ports::SocialAuthClient;
use account_service::domain::user::emails::EmailMessage;
use account_service::domain::user::emails::LinkBuilder;
use account_service::domain::user::errors::AccountError;
use account_service::domain::user::errors::MailerError;
use account_service::domain::user::models::User;
use account_service::domain::user::models::UserId;
use account_service::domain::user::models::Username;
use account_service::domain::user::ports::Mailer;
use account_service::domain::user::ports::UserRepository;
use account_service::domain::user::service::AccountService;
use account_service::domain::user::service::AccountSettings;
use account_service::inbound::http::router::create_router;
use async_trait::async_trait;
use auth::Authenticator;
use auth::PasswordHasher;
use auth::TokenAuthenticator;
use chrono::Duration;

pub const SECRET: &[u8] = b"test-secret-key-for-jwt-signing-at-least-32-bytes";

/// Test application that spawns a real server over in-memory adapters
pub struct TestApp {
    pub address: String,
    pub api_client: reqwest::Client,
    pub repository: Arc<InMemoryUserRepository>,
    pub mailer: Arc<RecordingMailer>,
    pub social_client: Arc<StubSocialAuthClient>,
    pub tokens: TokenAuthenticator,
}

impl TestApp {
    /// Spawn the application in a background task and return TestApp
    pub async fn spawn() -> Self {
        Self::spawn_with_whitelist(Vec::new()).await
    }

    pub async fn spawn_with_whitelist(whitelisted_domains: Vec<String>) -> Self {
        // Use random port (0 = OS assigns)
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind random port");
        let port = listener.local_addr().unwrap().port();
        let address = format!("http://127.0.0.1:{}", port);

        let repository = Arc::new(InMemoryUserRepository::default());
        let mailer = Arc::new(RecordingMailer::default());
        let social_client = Arc::new(StubSocialAuthClient::default());

        let authenticator = Arc::new(
            Authenticator::new(TokenAuthenticator::new(SECRET), Duration::hours(24))
                .with_password_hasher(PasswordHasher::with_params(256, 1, 1).unwrap()),
        );

        let mut providers = HashMap::new();
        providers.insert("google".to_string(), ProviderKind::OAuth2);
        providers.insert("twitter".to_string(), ProviderKind::OAuth1);

        let settings = AccountSettings {
            activation_ttl: Duration::hours(24),
            password_reset_ttl: Duration::hours(1),
            links: LinkBuilder::new(address.clone()),
            social: SocialPolicy::new(providers, whitelisted_domains),
        };

        let account_service = Arc::new(AccountService::new(
            Arc::clone(&repository),
            Arc::clone(&mailer),
            Arc::clone(&social_client),
            Arc::clone(&authenticator),
            settings,
        ));

        let router = create_router(account_service, authenticator);

        // Spawn server in background
        tokio::spawn(async move {
            axum::serve(listener, router).await.expect("Server error");
        });

        Self {
            address,
            api_client: reqwest::Client::new(),
            repository,
            mailer,
            social_client,
            tokens: TokenAuthenticator::new(SECRET),
        }
    }

    /// Helper to make GET request
    pub fn get(&self, path: &str) -> reqwest::RequestBuilder {
        self.api_client.get(format!("{}{}", self.address, path))
    }

    /// Helper to make POST request
    pub fn post(&self, path: &str) -> reqwest::RequestBuilder {
        self.api_client.post(format!("{}{}", self.address, path))
    }

    /// Helper to make PUT request
    pub fn put(&self, path: &str) -> reqwest::RequestBuilder {
        self.api_client.put(format!("{}{}", self.address, path))
    }

    /// Token carried by the last email sent to `email`
    pub fn last_token_for(&self, email: &str) -> String {
        let message = self
            .mailer
            .sent()
            .into_iter()
            .rev()
            .find(|m| m.to == email)
            .expect("No email sent to this address");

        message
            .action_link
            .rsplit('/')
            .next()
            .expect("Link carries no token")
            .to_string()
    }

    /// Register through the API and return the activation token
    pub async fn register(&self, username: &str, email: &str, password: &str) -> String {
        let response = self
            .post("/api/users")
            .json(&serde_json::json!({
                "username": username,
                "email": email,
                "password": password,
            }))
            .send()
            .await
            .expect("Failed to execute request");
        assert_eq!(response.status(), reqwest::StatusCode::CREATED);

        self.last_token_for(email)
    }

    /// Register, activate and log in; returns the session token
    pub async fn signed_in_user(&self, username: &str, email: &str, password: &str) -> String {
        let activation = self.register(username, email, password).await;
        self.get(&format!("/api/users/activate/{}", activation))
            .send()
            .await
            .expect("Failed to execute request");

        let body: serde_json::Value = self
            .post("/api/users/login")
            .json(&serde_json::json!({ "email": email, "password": password }))
            .send()
            .await
            .expect("Failed to execute request")
            .json()
            .await
            .expect("Failed to parse response");

        body["data"]["token"]
            .as_str()
            .expect("Login returned no token")
            .to_string()
    }
}

/// User store with the same uniqueness rules as the Postgres schema
#[derive(Default)]
pub struct InMemoryUserRepository {
    users: Mutex<HashMap<UserId, User>>,
    social_accounts: Mutex<HashMap<(String, String), UserId>>,
}

impl InMemoryUserRepository {
    fn check_unique(users: &HashMap<UserId, User>, user: &User) -> Result<(), AccountError> {
        for other in users.values().filter(|other| other.id != user.id) {
            if other.username == user.username {
                return Err(AccountError::UsernameAlreadyExists(
                    user.username.as_str().to_string(),
                ));
            }
            if other.email == user.email {
                return Err(AccountError::EmailAlreadyExists(
                    user.email.as_str().to_string(),
                ));
            }
        }
        Ok(())
    }

    pub fn get(&self, id: &UserId) -> Option<User> {
        self.users.lock().unwrap().get(id).cloned()
    }

    pub fn find_email(&self, email: &str) -> Option<User> {
        self.users
            .lock()
            .unwrap()
            .values()
            .find(|u| u.email.as_str() == email)
            .cloned()
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn create(&self, user: User) -> Result<User, AccountError> {
        let mut users = self.users.lock().unwrap();
        Self::check_unique(&users, &user)?;
        users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, AccountError> {
        Ok(self.get(id))
    }

    async fn find_by_username(&self, username: &Username) -> Result<Option<User>, AccountError> {
        Ok(self
            .users
            .lock()
            .unwrap()
            .values()
            .find(|u| &u.username == username)
            .cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AccountError> {
        Ok(self.find_email(email))
    }

    async fn update(&self, user: User) -> Result<User, AccountError> {
        let mut users = self.users.lock().unwrap();
        if !users.contains_key(&user.id) {
            return Err(AccountError::NotFound(user.id.to_string()));
        }
        Self::check_unique(&users, &user)?;
        users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn find_by_social_account(
        &self,
        provider: &str,
        uid: &str,
    ) -> Result<Option<User>, AccountError> {
        let linked = self
            .social_accounts
            .lock()
            .unwrap()
            .get(&(provider.to_string(), uid.to_string()))
            .copied();
        Ok(linked.and_then(|id| self.get(&id)))
    }

    async fn link_social_account(
        &self,
        user_id: &UserId,
        provider: &str,
        uid: &str,
    ) -> Result<(), AccountError> {
        self.social_accounts
            .lock()
            .unwrap()
            .entry((provider.to_string(), uid.to_string()))
            .or_insert(*user_id);
        Ok(())
    }
}

/// Mailer that keeps every message instead of sending it
#[derive(Default)]
pub struct RecordingMailer {
    sent: Mutex<Vec<EmailMessage>>,
    failing: Mutex<bool>,
}

impl RecordingMailer {
    pub fn sent(&self) -> Vec<EmailMessage> {
        self.sent.lock().unwrap().clone()
    }

    pub fn fail_deliveries(&self, failing: bool) {
        *self.failing.lock().unwrap() = failing;
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, message: &EmailMessage) -> Result<(), MailerError> {
        if *self.failing.lock().unwrap() {
            return Err(MailerError::ConnectionFailed("mail provider is down".to_string()));
        }
        self.sent.lock().unwrap().push(message.clone());
        Ok(())
    }
}

/// Social client that knows a fixed set of access tokens
#[derive(Default)]
pub struct StubSocialAuthClient {
    identities: Mutex<HashMap<String, SocialIdentity>>,
    calls: Mutex<usize>,
}

impl StubSocialAuthClient {
    pub fn accept(&self, token: &str, identity: SocialIdentity) {
        self.identities
            .lock()
            .unwrap()
            .insert(token.to_string(), identity);
    }

    pub fn calls(&self) -> usize {
        *self.calls.lock().unwrap()
    }
}

#[async_trait]
impl SocialAuthClient for StubSocialAuthClient {
    async fn fetch_identity(
        &self,
        _provider: &str,
        credentials: &SocialCredentials,
    ) -> Result<SocialIdentity, SocialAuthError> {
        *self.calls.lock().unwrap() += 1;

        let token = match credentials {
            SocialCredentials::OAuth1 { token, .. } | SocialCredentials::OAuth2 { token } => token,
        };

        self.identities
            .lock()
            .unwrap()
            .get(token)
            .cloned()
            .ok_or_else(|| SocialAuthError::InvalidCredentials("unknown token".to_string()))
    }
}
