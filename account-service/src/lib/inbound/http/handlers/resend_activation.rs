use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;

use super::ApiError;
use super::ApiSuccess;
use super::MessageData;
use crate::domain::user::ports::AccountServicePort;
use crate::inbound::http::router::AppState;
use crate::user::errors::AccountError;

pub async fn resend_activation(
    State(state): State<AppState>,
    Json(body): Json<EmailRequest>,
) -> Result<ApiSuccess<MessageData>, ApiError> {
    let email = body.into_email()?;
    state.account_service.resend_activation(&email).await?;

    Ok(ApiSuccess::new(
        StatusCode::OK,
        MessageData::new(format!("A new activation link was sent to {}", email)),
    ))
}

/// Request body carrying only an email address.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct EmailRequest {
    email: Option<String>,
}

impl EmailRequest {
    pub(super) fn into_email(self) -> Result<String, AccountError> {
        self.email
            .map(|e| e.trim().to_string())
            .filter(|e| !e.is_empty())
            .ok_or(AccountError::MissingField("email"))
    }
}
