use std::sync::Arc;

use async_trait::async_trait;
use auth::Authenticator;
use auth::AuthenticationError;
use auth::IssuedToken;
use auth::Purpose;
use chrono::Duration;
use chrono::Utc;
use uuid::Uuid;

use crate::domain::social::models::SocialCredentials;
use crate::domain::social::models::SocialIdentity;
use crate::domain::social::models::SocialPolicy;
use crate::domain::social::models::SocialSignInCommand;
use crate::domain::social::ports::SocialAuthClient;
use crate::domain::user::emails::EmailMessage;
use crate::domain::user::emails::LinkBuilder;
use crate::domain::user::models::ActivationOutcome;
use crate::domain::user::models::EmailAddress;
use crate::domain::user::models::LoginCommand;
use crate::domain::user::models::LoginIdentifier;
use crate::domain::user::models::Password;
use crate::domain::user::models::RegisterCommand;
use crate::domain::user::models::Session;
use crate::domain::user::models::UpdateUserCommand;
use crate::domain::user::models::User;
use crate::domain::user::models::UserId;
use crate::domain::user::models::Username;
use crate::user::errors::AccountError;
use crate::user::ports::AccountServicePort;
use crate::user::ports::Mailer;
use crate::user::ports::UserRepository;

/// Token lifetimes, link base and social policy for the account service.
#[derive(Debug, Clone)]
pub struct AccountSettings {
    pub activation_ttl: Duration,
    pub password_reset_ttl: Duration,
    pub links: LinkBuilder,
    pub social: SocialPolicy,
}

/// Domain service implementation for account operations.
///
/// Concrete implementation of AccountServicePort with dependency injection.
/// The token core only answers "is this token valid"; whether the principal
/// exists and what state it is in is decided here against the repository.
pub struct AccountService<UR, M, SC>
where
    UR: UserRepository,
    M: Mailer,
    SC: SocialAuthClient,
{
    repository: Arc<UR>,
    mailer: Arc<M>,
    social_client: Arc<SC>,
    authenticator: Arc<Authenticator>,
    settings: AccountSettings,
}

impl<UR, M, SC> AccountService<UR, M, SC>
where
    UR: UserRepository,
    M: Mailer,
    SC: SocialAuthClient,
{
    /// Create a new account service with injected dependencies.
    ///
    /// # Arguments
    /// * `repository` - User persistence implementation
    /// * `mailer` - Outbound email delivery
    /// * `social_client` - Third-party identity verification
    /// * `authenticator` - Password hashing and token issuance/verification
    /// * `settings` - Token lifetimes, link base URL, social policy
    pub fn new(
        repository: Arc<UR>,
        mailer: Arc<M>,
        social_client: Arc<SC>,
        authenticator: Arc<Authenticator>,
        settings: AccountSettings,
    ) -> Self {
        Self {
            repository,
            mailer,
            social_client,
            authenticator,
            settings,
        }
    }

    /// Verify a token for `purpose` and return the principal it names.
    fn verify_token(&self, token: &str, purpose: Purpose) -> Result<UserId, AccountError> {
        let verified = self
            .authenticator
            .tokens()
            .verify_for(token, purpose)
            .map_err(|e| {
                tracing::warn!(purpose = %purpose, error = %e, "Token rejected");
                AccountError::from(e)
            })?;

        UserId::from_string(&verified.subject).map_err(|e| {
            tracing::warn!(purpose = %purpose, error = %e, "Token subject is not a user id");
            AccountError::MalformedToken
        })
    }

    fn issue_token(
        &self,
        user: &User,
        purpose: Purpose,
        ttl: Duration,
    ) -> Result<IssuedToken, AccountError> {
        Ok(self.authenticator.tokens().issue(user.id, purpose, ttl)?)
    }

    async fn find_by_email_or_unknown(&self, email: &str) -> Result<User, AccountError> {
        let email = EmailAddress::normalize(email);
        self.repository
            .find_by_email(&email)
            .await?
            .ok_or(AccountError::UnknownEmail(email))
    }

    async fn deliver(&self, message: EmailMessage) -> Result<(), AccountError> {
        self.mailer.send(&message).await.map_err(|e| {
            tracing::error!(to = %message.to, subject = %message.subject, error = %e, "Email delivery failed");
            AccountError::from(e)
        })
    }

    /// Lookup is done by the caller; here a token is issued, then delivered.
    async fn send_activation(&self, user: &User) -> Result<(), AccountError> {
        let issued = self.issue_token(user, Purpose::Activation, self.settings.activation_ttl)?;
        let message = EmailMessage::activation(user, self.settings.links.activation(&issued.token));
        self.deliver(message).await?;

        tracing::info!(user_id = %user.id, expires_at = %issued.expires_at, "Activation email sent");
        Ok(())
    }

    async fn resolve_social_user(
        &self,
        identity: &SocialIdentity,
        email: Option<EmailAddress>,
        current_user: Option<UserId>,
    ) -> Result<User, AccountError> {
        if let Some(linked) = self
            .repository
            .find_by_social_account(&identity.provider, &identity.uid)
            .await?
        {
            if current_user.is_some_and(|current| current != linked.id) {
                return Err(AccountError::Forbidden(format!(
                    "This {} account is already associated with another user",
                    identity.provider
                )));
            }
            return Ok(linked);
        }

        let user = match (current_user, email) {
            (Some(current), _) => self.get_user(&current).await?,
            (None, Some(email)) => match self.repository.find_by_email(email.as_str()).await? {
                Some(existing) => existing,
                None => self.create_social_user(identity, email).await?,
            },
            (None, None) => {
                return Err(AccountError::CredentialError(format!(
                    "{} did not provide an email address",
                    identity.provider
                )))
            }
        };

        self.repository
            .link_social_account(&user.id, &identity.provider, &identity.uid)
            .await?;
        tracing::info!(
            user_id = %user.id,
            provider = %identity.provider,
            "Social account linked"
        );

        Ok(user)
    }

    async fn create_social_user(
        &self,
        identity: &SocialIdentity,
        email: EmailAddress,
    ) -> Result<User, AccountError> {
        let username = self.available_username(identity, &email).await?;
        // Nobody knows this password; the account signs in through the provider
        // until the owner resets it.
        let password_hash = self
            .authenticator
            .hash_password(&Uuid::new_v4().to_string())?;

        let now = Utc::now();
        let user = User {
            id: UserId::new(),
            username,
            email,
            password_hash,
            is_activated: true,
            created_at: now,
            updated_at: now,
        };

        self.repository.create(user).await
    }

    async fn available_username(
        &self,
        identity: &SocialIdentity,
        email: &EmailAddress,
    ) -> Result<Username, AccountError> {
        let handle = identity
            .username
            .as_deref()
            .unwrap_or_else(|| email.as_str().split('@').next().unwrap_or_default());
        let base = sanitize_handle(handle);

        let mut candidate = base.clone();
        for _ in 0..5 {
            let username = Username::new(candidate)?;
            if self.repository.find_by_username(&username).await?.is_none() {
                return Ok(username);
            }
            candidate = format!("{}-{}", base, &Uuid::new_v4().simple().to_string()[..6]);
        }

        Err(AccountError::Unknown(format!(
            "Could not find a free username for {}",
            base
        )))
    }
}

/// Reduce a provider handle to username characters, at most 24 long.
fn sanitize_handle(handle: &str) -> String {
    let cleaned: String = handle
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_' || *c == '-')
        .take(24)
        .collect();

    if cleaned.len() < Username::MIN_LENGTH {
        format!("user{}", cleaned)
    } else {
        cleaned
    }
}

#[async_trait]
impl<UR, M, SC> AccountServicePort for AccountService<UR, M, SC>
where
    UR: UserRepository,
    M: Mailer,
    SC: SocialAuthClient,
{
    async fn register(&self, command: RegisterCommand) -> Result<User, AccountError> {
        let password_hash = self.authenticator.hash_password(command.password.as_str())?;

        let now = Utc::now();
        let user = User {
            id: UserId::new(),
            username: command.username,
            email: command.email,
            password_hash,
            is_activated: false,
            created_at: now,
            updated_at: now,
        };

        let created_user = self.repository.create(user).await?;
        tracing::info!(user_id = %created_user.id, "Account registered");

        self.send_activation(&created_user).await?;

        Ok(created_user)
    }

    async fn login(&self, command: LoginCommand) -> Result<Session, AccountError> {
        let user = match &command.identifier {
            LoginIdentifier::Email(email) => {
                self.repository
                    .find_by_email(&EmailAddress::normalize(email))
                    .await?
            }
            LoginIdentifier::Username(username) => match Username::new(username.clone()) {
                Ok(username) => self.repository.find_by_username(&username).await?,
                Err(_) => None,
            },
        }
        .ok_or(AccountError::InvalidCredentials)?;

        let token = self
            .authenticator
            .login(&command.password, &user.password_hash, user.id)
            .map_err(|e| match e {
                AuthenticationError::InvalidCredentials => AccountError::InvalidCredentials,
                AuthenticationError::PasswordError(err) => AccountError::from(err),
                AuthenticationError::TokenError(err) => AccountError::from(err),
            })?;

        tracing::info!(user_id = %user.id, "Session opened");
        Ok(Session { user, token })
    }

    async fn activate(&self, token: &str) -> Result<ActivationOutcome, AccountError> {
        let user_id = self.verify_token(token, Purpose::Activation)?;
        let mut user = self.get_user(&user_id).await?;

        if user.is_activated {
            return Ok(ActivationOutcome::AlreadyActivated);
        }

        user.is_activated = true;
        user.updated_at = Utc::now();
        self.repository.update(user).await?;

        tracing::info!(user_id = %user_id, "Account activated");
        Ok(ActivationOutcome::Activated)
    }

    async fn resend_activation(&self, email: &str) -> Result<(), AccountError> {
        let user = self.find_by_email_or_unknown(email).await?;
        self.send_activation(&user).await
    }

    async fn request_password_reset(&self, email: &str) -> Result<(), AccountError> {
        let user = self.find_by_email_or_unknown(email).await?;
        if !user.is_activated {
            return Err(AccountError::NotActivated);
        }

        let issued = self.issue_token(&user, Purpose::PasswordReset, self.settings.password_reset_ttl)?;
        let message =
            EmailMessage::password_reset(&user, self.settings.links.password_reset(&issued.token));
        self.deliver(message).await?;

        tracing::info!(user_id = %user.id, expires_at = %issued.expires_at, "Password reset email sent");
        Ok(())
    }

    async fn reset_password(&self, token: &str, password: String) -> Result<(), AccountError> {
        let user_id = self.verify_token(token, Purpose::PasswordReset)?;
        let mut user = self.get_user(&user_id).await?;
        let password = Password::new(password)?;

        if self
            .authenticator
            .password_matches(password.as_str(), &user.password_hash)?
        {
            return Err(AccountError::SamePassword);
        }

        user.password_hash = self.authenticator.hash_password(password.as_str())?;
        user.updated_at = Utc::now();
        self.repository.update(user).await?;

        tracing::info!(user_id = %user_id, "Password reset");
        Ok(())
    }

    async fn social_sign_in(&self, command: SocialSignInCommand) -> Result<Session, AccountError> {
        let kind = self
            .settings
            .social
            .provider_kind(&command.provider)
            .ok_or_else(|| AccountError::ProviderError(command.provider.clone()))?;

        let credentials = SocialCredentials::for_kind(
            kind,
            command.access_token,
            command.access_token_secret,
        )?;

        let identity = self
            .social_client
            .fetch_identity(&command.provider, &credentials)
            .await
            .map_err(|e| {
                tracing::warn!(provider = %command.provider, error = %e, "Social authentication failed");
                AccountError::from(e)
            })?;

        let email = identity
            .email
            .clone()
            .and_then(|raw| EmailAddress::new(raw).ok());
        if !self.settings.social.admits(email.as_ref()) {
            return Err(AccountError::Forbidden(format!(
                "Email domain is not allowed to sign in with {}",
                identity.provider
            )));
        }

        let user = self
            .resolve_social_user(&identity, email, command.current_user)
            .await?;
        let token = self.authenticator.issue_session(user.id)?;

        tracing::info!(user_id = %user.id, provider = %identity.provider, "Social session opened");
        Ok(Session { user, token })
    }

    async fn get_user(&self, id: &UserId) -> Result<User, AccountError> {
        self.repository
            .find_by_id(id)
            .await?
            .ok_or(AccountError::NotFound(id.to_string()))
    }

    async fn update_user(
        &self,
        id: &UserId,
        command: UpdateUserCommand,
    ) -> Result<User, AccountError> {
        let mut user = self.get_user(id).await?;

        if let Some(new_username) = command.username {
            user.username = new_username;
        }

        if let Some(new_email) = command.email {
            user.email = new_email;
        }

        if let Some(new_password) = command.password {
            user.password_hash = self.authenticator.hash_password(new_password.as_str())?;
        }

        user.updated_at = Utc::now();
        self.repository.update(user).await
    }
}
