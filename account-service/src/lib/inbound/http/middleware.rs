use auth::Purpose;
use axum::extract::Request;
use axum::extract::State;
use axum::http::{self};
use axum::middleware::Next;
use axum::response::Response;

use crate::domain::user::models::UserId;
use crate::inbound::http::handlers::ApiError;
use crate::inbound::http::router::AppState;

/// Extension type to store the authenticated principal in request extensions
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub user_id: UserId,
}

/// Middleware that requires a valid session token.
pub async fn authenticate(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = extract_token_from_header(&req)?.ok_or_else(|| {
        ApiError::Unauthorized(
            "missing_token",
            "Missing Authorization header".to_string(),
        )
    })?;

    let user = verify_session(&state, token)?;
    req.extensions_mut().insert(user);

    Ok(next.run(req).await)
}

/// Middleware that authenticates the request only when a token is presented.
///
/// A presented token must still be valid; an absent one lets the request
/// through anonymously.
pub async fn authenticate_optional(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    if let Some(token) = extract_token_from_header(&req)? {
        let user = verify_session(&state, token)?;
        req.extensions_mut().insert(user);
    }

    Ok(next.run(req).await)
}

fn verify_session(state: &AppState, token: &str) -> Result<AuthenticatedUser, ApiError> {
    let verified = state
        .authenticator
        .tokens()
        .verify_for(token, Purpose::Session)
        .map_err(|e| {
            tracing::warn!(error = %e, "Session token rejected");
            ApiError::invalid_token()
        })?;

    let user_id = UserId::from_string(&verified.subject).map_err(|e| {
        tracing::warn!(error = %e, "Session token subject is not a user id");
        ApiError::invalid_token()
    })?;

    Ok(AuthenticatedUser { user_id })
}

fn extract_token_from_header(req: &Request) -> Result<Option<&str>, ApiError> {
    let Some(auth_header) = req.headers().get(http::header::AUTHORIZATION) else {
        return Ok(None);
    };

    let auth_str = auth_header.to_str().map_err(|_| {
        ApiError::Unauthorized(
            "missing_token",
            "Invalid Authorization header".to_string(),
        )
    })?;

    auth_str
        .strip_prefix("Bearer ")
        .map(|token| Some(token.trim()))
        .ok_or_else(|| {
            ApiError::Unauthorized(
                "missing_token",
                "Invalid Authorization header format. Expected: Bearer <token>".to_string(),
            )
        })
}
