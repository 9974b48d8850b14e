use axum::extract::State;
use axum::http::StatusCode;
use axum::Extension;
use axum::Json;
use serde::Deserialize;
use serde::Serialize;

use super::ApiError;
use super::ApiSuccess;
use crate::domain::social::models::SocialSignInCommand;
use crate::domain::user::models::Session;
use crate::domain::user::ports::AccountServicePort;
use crate::inbound::http::middleware::AuthenticatedUser;
use crate::inbound::http::router::AppState;
use crate::user::errors::AccountError;

/// Sign in with a provider access token. A valid session token in the
/// request links the provider identity to the signed-in account instead.
pub async fn social_sign_in(
    State(state): State<AppState>,
    current_user: Option<Extension<AuthenticatedUser>>,
    Json(body): Json<SocialSignInRequest>,
) -> Result<ApiSuccess<SocialSignInResponseData>, ApiError> {
    let command = body.try_into_command(current_user.map(|Extension(user)| user))?;

    state
        .account_service
        .social_sign_in(command)
        .await
        .map_err(ApiError::from)
        .map(|ref session| ApiSuccess::new(StatusCode::OK, session.into()))
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SocialSignInRequest {
    provider: Option<String>,
    access_token: Option<String>,
    access_token_secret: Option<String>,
}

impl SocialSignInRequest {
    fn try_into_command(
        self,
        current_user: Option<AuthenticatedUser>,
    ) -> Result<SocialSignInCommand, AccountError> {
        let provider = self
            .provider
            .map(|p| p.trim().to_lowercase())
            .filter(|p| !p.is_empty())
            .ok_or(AccountError::MissingField("provider"))?;

        Ok(SocialSignInCommand {
            provider,
            access_token: self.access_token,
            access_token_secret: self.access_token_secret,
            current_user: current_user.map(|user| user.user_id),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SocialSignInResponseData {
    pub email: String,
    pub username: String,
    pub token: String,
}

impl From<&Session> for SocialSignInResponseData {
    fn from(session: &Session) -> Self {
        Self {
            email: session.user.email.as_str().to_string(),
            username: session.user.username.as_str().to_string(),
            token: session.token.token.clone(),
        }
    }
}
