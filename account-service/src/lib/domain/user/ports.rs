use async_trait::async_trait;

use crate::domain::social::models::SocialSignInCommand;
use crate::domain::user::emails::EmailMessage;
use crate::domain::user::models::ActivationOutcome;
use crate::domain::user::models::LoginCommand;
use crate::domain::user::models::RegisterCommand;
use crate::domain::user::models::Session;
use crate::domain::user::models::UpdateUserCommand;
use crate::domain::user::models::User;
use crate::domain::user::models::UserId;
use crate::user::errors::AccountError;
use crate::user::errors::MailerError;
use crate::user::models::Username;

/// Port for account domain service operations.
#[async_trait]
pub trait AccountServicePort: Send + Sync + 'static {
    /// Register a new account and send its activation email.
    ///
    /// # Arguments
    /// * `command` - Validated username, email, and password
    ///
    /// # Returns
    /// Created (not yet activated) user
    ///
    /// # Errors
    /// * `UsernameAlreadyExists` - Username is already taken
    /// * `EmailAlreadyExists` - Email is already registered
    /// * `MailDelivery` - Account was created but the email could not be sent
    /// * `DatabaseError` - Database operation failed
    async fn register(&self, command: RegisterCommand) -> Result<User, AccountError>;

    /// Check credentials and open a session.
    ///
    /// # Errors
    /// * `InvalidCredentials` - Unknown principal or wrong password
    /// * `DatabaseError` - Database operation failed
    async fn login(&self, command: LoginCommand) -> Result<Session, AccountError>;

    /// Consume an activation token.
    ///
    /// Idempotent: a second valid token for an activated account reports
    /// `AlreadyActivated` instead of failing.
    ///
    /// # Errors
    /// * `MalformedToken` / `InvalidSignature` / `Expired` - Token rejected
    /// * `PurposeMismatch` - Token was not issued for activation
    /// * `NotFound` - Principal no longer exists
    async fn activate(&self, token: &str) -> Result<ActivationOutcome, AccountError>;

    /// Issue a fresh activation token and email it.
    ///
    /// # Errors
    /// * `UnknownEmail` - No account with this email
    /// * `MailDelivery` - Email could not be sent
    async fn resend_activation(&self, email: &str) -> Result<(), AccountError>;

    /// Issue a password reset token and email it.
    ///
    /// # Errors
    /// * `UnknownEmail` - No account with this email
    /// * `NotActivated` - Account has not been activated yet
    /// * `MailDelivery` - Email could not be sent
    async fn request_password_reset(&self, email: &str) -> Result<(), AccountError>;

    /// Consume a password reset token and replace the password.
    ///
    /// The new password is only checked against the policy once the token
    /// has been accepted.
    ///
    /// # Errors
    /// * `MalformedToken` / `InvalidSignature` / `Expired` - Token rejected
    /// * `PurposeMismatch` - Token was not issued for password reset
    /// * `NotFound` - Principal no longer exists
    /// * `InvalidPassword` - New password violates the password policy
    /// * `SamePassword` - New password equals the current one
    async fn reset_password(&self, token: &str, password: String) -> Result<(), AccountError>;

    /// Sign in with third-party credentials, linking or creating a local account.
    ///
    /// # Errors
    /// * `ProviderError` - Provider not configured (no network call is made)
    /// * `MissingField` - Credentials incomplete for the provider kind
    /// * `CredentialError` - Provider rejected the credentials
    /// * `Forbidden` - Provider or local policy refuses the identity
    async fn social_sign_in(&self, command: SocialSignInCommand) -> Result<Session, AccountError>;

    /// Retrieve user by unique identifier.
    ///
    /// # Errors
    /// * `NotFound` - User does not exist
    /// * `DatabaseError` - Database operation failed
    async fn get_user(&self, id: &UserId) -> Result<User, AccountError>;

    /// Update existing user with optional fields.
    ///
    /// # Errors
    /// * `NotFound` - User does not exist
    /// * `UsernameAlreadyExists` - New username is already taken
    /// * `EmailAlreadyExists` - New email is already registered
    /// * `DatabaseError` - Database operation failed
    async fn update_user(&self, id: &UserId, command: UpdateUserCommand)
        -> Result<User, AccountError>;
}

/// Persistence operations for user aggregate.
#[async_trait]
pub trait UserRepository: Send + Sync + 'static {
    /// Persist new user to storage.
    ///
    /// # Errors
    /// * `UsernameAlreadyExists` - Username is already taken
    /// * `EmailAlreadyExists` - Email is already registered
    /// * `DatabaseError` - Database operation failed
    async fn create(&self, user: User) -> Result<User, AccountError>;

    /// Retrieve user by identifier.
    ///
    /// # Returns
    /// Optional user entity (None if not found)
    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, AccountError>;

    /// Retrieve user by username.
    async fn find_by_username(&self, username: &Username) -> Result<Option<User>, AccountError>;

    /// Retrieve user by (normalized) email address.
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AccountError>;

    /// Save changes to an existing user.
    ///
    /// # Errors
    /// * `NotFound` - User does not exist
    /// * `UsernameAlreadyExists` - New username is already taken
    /// * `EmailAlreadyExists` - New email is already registered
    /// * `DatabaseError` - Database operation failed
    async fn update(&self, user: User) -> Result<User, AccountError>;

    /// Retrieve the user linked to a provider identity.
    async fn find_by_social_account(
        &self,
        provider: &str,
        uid: &str,
    ) -> Result<Option<User>, AccountError>;

    /// Link a provider identity to a user. Linking the same identity twice is a no-op.
    async fn link_social_account(
        &self,
        user_id: &UserId,
        provider: &str,
        uid: &str,
    ) -> Result<(), AccountError>;
}

/// Outbound email delivery.
#[async_trait]
pub trait Mailer: Send + Sync + 'static {
    /// Hand a message to the mail provider.
    ///
    /// # Errors
    /// * `InvalidMessage` - Message could not be encoded
    /// * `Rejected` - Provider refused the message
    /// * `ConnectionFailed` - Provider could not be reached
    async fn send(&self, message: &EmailMessage) -> Result<(), MailerError>;
}
