use axum::extract::Path;
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

pub async fn reset_password(
    State(state): State<AppState>,
    Path(token): Path<String>,
    Json(body): Json<ResetPasswordRequest>,
) -> Result<ApiSuccess<MessageData>, ApiError> {
    let password = body.into_password()?;

    state.account_service.reset_password(&token, password).await?;

    Ok(ApiSuccess::new(
        StatusCode::OK,
        MessageData::new("Password updated, you can now sign in"),
    ))
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ResetPasswordRequest {
    password: Option<String>,
}

impl ResetPasswordRequest {
    fn into_password(self) -> Result<String, AccountError> {
        self.password
            .filter(|p| !p.is_empty())
            .ok_or(AccountError::MissingField("password"))
    }
}
