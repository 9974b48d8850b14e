use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::response::Response;
use axum::Json;
use chrono::DateTime;
use chrono::Utc;
use serde::Serialize;

use crate::domain::user::models::User;
use crate::user::errors::AccountError;

pub mod activate;
pub mod current_user;
pub mod login;
pub mod register;
pub mod request_password_reset;
pub mod resend_activation;
pub mod reset_password;
pub mod social_sign_in;

/// Message returned for every rejected token, whatever the cause.
pub const INVALID_TOKEN_MESSAGE: &str = "Invalid or expired token";

#[derive(Debug, Clone)]
pub struct ApiSuccess<T: Serialize + PartialEq>(StatusCode, Json<ApiResponseBody<T>>);

impl<T> PartialEq for ApiSuccess<T>
where
    T: Serialize + PartialEq,
{
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0 && self.1 .0 == other.1 .0
    }
}

impl<T: Serialize + PartialEq> ApiSuccess<T> {
    pub fn new(status: StatusCode, data: T) -> Self {
        ApiSuccess(status, Json(ApiResponseBody::new(status, data)))
    }
}

impl<T: Serialize + PartialEq> IntoResponse for ApiSuccess<T> {
    fn into_response(self) -> Response {
        (self.0, self.1).into_response()
    }
}

/// HTTP-facing error. Variants without an explicit reason carry a fixed one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    InternalServerError(String),
    UnprocessableEntity(String),
    BadRequest(&'static str, String),
    NotFound(&'static str, String),
    Conflict(String),
    Unauthorized(&'static str, String),
    Forbidden(String),
    BadGateway(String),
}

impl ApiError {
    pub fn invalid_token() -> Self {
        ApiError::Unauthorized("invalid_token", INVALID_TOKEN_MESSAGE.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, reason, message) = match self {
            ApiError::InternalServerError(msg) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", msg)
            }
            ApiError::UnprocessableEntity(msg) => {
                (StatusCode::UNPROCESSABLE_ENTITY, "validation_error", msg)
            }
            ApiError::BadRequest(reason, msg) => (StatusCode::BAD_REQUEST, reason, msg),
            ApiError::NotFound(reason, msg) => (StatusCode::NOT_FOUND, reason, msg),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, "validation_error", msg),
            ApiError::Unauthorized(reason, msg) => (StatusCode::UNAUTHORIZED, reason, msg),
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, "forbidden", msg),
            ApiError::BadGateway(msg) => (StatusCode::BAD_GATEWAY, "mail_delivery_failed", msg),
        };

        (
            status,
            Json(ApiResponseBody::new_error(status, reason, message)),
        )
            .into_response()
    }
}

impl From<AccountError> for ApiError {
    fn from(err: AccountError) -> Self {
        match err {
            AccountError::InvalidUsername(_)
            | AccountError::InvalidEmail(_)
            | AccountError::InvalidPassword(_) => ApiError::UnprocessableEntity(err.to_string()),
            AccountError::UsernameAlreadyExists(_) | AccountError::EmailAlreadyExists(_) => {
                ApiError::Conflict(err.to_string())
            }
            AccountError::MalformedToken
            | AccountError::InvalidSignature
            | AccountError::Expired
            | AccountError::PurposeMismatch => ApiError::invalid_token(),
            AccountError::InvalidCredentials => {
                ApiError::Unauthorized(err.reason(), err.to_string())
            }
            AccountError::MissingField(_)
            | AccountError::SamePassword
            | AccountError::NotActivated
            | AccountError::ProviderError(_)
            | AccountError::CredentialError(_) => ApiError::BadRequest(err.reason(), err.to_string()),
            AccountError::UnknownEmail(_) | AccountError::NotFound(_) => {
                ApiError::NotFound(err.reason(), err.to_string())
            }
            AccountError::Forbidden(_) => ApiError::Forbidden(err.to_string()),
            AccountError::MailDelivery(_) => ApiError::BadGateway(
                "The email could not be sent, please try again later".to_string(),
            ),
            AccountError::Password(_) | AccountError::DatabaseError(_) | AccountError::Unknown(_) => {
                tracing::error!(error = %err, "Request failed");
                ApiError::InternalServerError("Internal server error".to_string())
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApiResponseBody<T: Serialize + PartialEq> {
    status_code: u16,
    data: T,
}

impl<T: Serialize + PartialEq> ApiResponseBody<T> {
    pub fn new(status_code: StatusCode, data: T) -> Self {
        Self {
            status_code: status_code.as_u16(),
            data,
        }
    }
}

impl ApiResponseBody<ApiErrorData> {
    pub fn new_error(status_code: StatusCode, reason: &str, message: String) -> Self {
        Self {
            status_code: status_code.as_u16(),
            data: ApiErrorData {
                reason: reason.to_string(),
                message,
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApiErrorData {
    pub reason: String,
    pub message: String,
}

/// A plain confirmation message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MessageData {
    pub message: String,
}

impl MessageData {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Public view of a user. The password hash never leaves the service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserData {
    pub id: String,
    pub username: String,
    pub email: String,
    pub is_activated: bool,
    pub created_at: DateTime<Utc>,
}

impl From<&User> for UserData {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.to_string(),
            username: user.username.as_str().to_string(),
            email: user.email.as_str().to_string(),
            is_activated: user.is_activated,
            created_at: user.created_at,
        }
    }
}
