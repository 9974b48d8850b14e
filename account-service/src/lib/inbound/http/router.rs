use std::sync::Arc;
use std::time::Duration;

use auth::Authenticator;
use axum::body::Body;
use axum::extract::MatchedPath;
use axum::http::Request;
use axum::http::Response;
use axum::middleware;
use axum::routing::get;
use axum::routing::post;
use axum::routing::put;
use axum::Router;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::Span;

use super::handlers::activate::activate;
use super::handlers::current_user::get_current_user;
use super::handlers::current_user::update_current_user;
use super::handlers::login::login;
use super::handlers::register::register;
use super::handlers::request_password_reset::request_password_reset;
use super::handlers::resend_activation::resend_activation;
use super::handlers::reset_password::reset_password;
use super::handlers::social_sign_in::social_sign_in;
use super::middleware::authenticate as auth_middleware;
use super::middleware::authenticate_optional;
use crate::domain::user::ports::AccountServicePort;

#[derive(Clone)]
pub struct AppState {
    pub account_service: Arc<dyn AccountServicePort>,
    pub authenticator: Arc<Authenticator>,
}

pub fn create_router(
    account_service: Arc<dyn AccountServicePort>,
    authenticator: Arc<Authenticator>,
) -> Router {
    let state = AppState {
        account_service,
        authenticator,
    };

    let public_routes = Router::new()
        .route("/api/users", post(register))
        .route("/api/users/login", post(login))
        .route("/api/users/activate/:token", get(activate))
        .route("/api/users/activation/resend", post(resend_activation))
        .route("/api/users/password/reset", post(request_password_reset))
        .route("/api/users/password/reset/:token", put(reset_password));

    let social_routes = Router::new()
        .route("/api/users/oauth", post(social_sign_in))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            authenticate_optional,
        ));

    let protected_routes = Router::new()
        .route("/api/user", get(get_current_user).put(update_current_user))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    // Paths carry tokens, so spans record the route template only.
    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(|request: &Request<Body>| {
            let route = request
                .extensions()
                .get::<MatchedPath>()
                .map(MatchedPath::as_str)
                .unwrap_or("unmatched");

            tracing::info_span!(
                "http_request",
                method = %request.method(),
                route = %route,
                version = ?request.version(),
            )
        })
        .on_request(|request: &Request<Body>, _span: &Span| {
            tracing::info!(method = %request.method(), "Request started");
        })
        .on_response(
            |response: &Response<Body>, latency: Duration, _span: &Span| {
                tracing::info!(
                    status = response.status().as_u16(),
                    latency_ms = latency.as_millis(),
                    "Request completed"
                );
            },
        );

    Router::new()
        .merge(public_routes)
        .merge(social_routes)
        .merge(protected_routes)
        .layer(
            ServiceBuilder::new()
                .layer(trace_layer)
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}
