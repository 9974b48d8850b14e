use axum::extract::Path;
use axum::extract::State;
use axum::http::StatusCode;

use super::ApiError;
use super::ApiSuccess;
use super::MessageData;
use crate::domain::user::models::ActivationOutcome;
use crate::domain::user::ports::AccountServicePort;
use crate::inbound::http::router::AppState;

pub async fn activate(
    State(state): State<AppState>,
    Path(token): Path<String>,
) -> Result<ApiSuccess<MessageData>, ApiError> {
    let outcome = state.account_service.activate(&token).await?;

    let message = match outcome {
        ActivationOutcome::Activated => "Account activated, you can now sign in",
        ActivationOutcome::AlreadyActivated => "Account is already activated",
    };

    Ok(ApiSuccess::new(StatusCode::OK, MessageData::new(message)))
}
