use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;

use super::resend_activation::EmailRequest;
use super::ApiError;
use super::ApiSuccess;
use super::MessageData;
use crate::domain::user::ports::AccountServicePort;
use crate::inbound::http::router::AppState;

pub async fn request_password_reset(
    State(state): State<AppState>,
    Json(body): Json<EmailRequest>,
) -> Result<ApiSuccess<MessageData>, ApiError> {
    let email = body.into_email()?;
    state.account_service.request_password_reset(&email).await?;

    Ok(ApiSuccess::new(
        StatusCode::OK,
        MessageData::new(format!("A password reset link was sent to {}", email)),
    ))
}
