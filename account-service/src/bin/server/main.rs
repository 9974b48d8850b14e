use std::sync::Arc;

use account_service::config::Config;
use account_service::domain::social::models::SocialPolicy;
use account_service::domain::user::emails::LinkBuilder;
use account_service::domain::user::service::AccountService;
use account_service::domain::user::service::AccountSettings;
use account_service::inbound::http::router::create_router;
use account_service::outbound::mail::HttpMailer;
use account_service::outbound::repositories::PostgresUserRepository;
use account_service::outbound::social::HttpSocialAuthClient;
use auth::Authenticator;
use auth::TokenAuthenticator;
use chrono::Duration;
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "account_service=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!(
        service = "account-service",
        version = env!("CARGO_PKG_VERSION"),
        "Service starting"
    );

    let config = Config::load()?;

    tracing::info!(
        http_port = config.server.http_port,
        session_ttl_hours = config.jwt.session_ttl_hours,
        previous_secrets = config.jwt.previous_secrets.len(),
        social_providers = config.social.providers.len(),
        public_base_url = %config.mail.public_base_url,
        "Configuration loaded"
    );

    let pg_pool = PgPoolOptions::new()
        .max_connections(config.database.max_connections)
        .connect(&config.database.url)
        .await?;
    tracing::info!(
        max_connections = config.database.max_connections,
        database = "postgresql",
        "Database connection pool created"
    );

    sqlx::migrate!("./migrations").run(&pg_pool).await?;
    tracing::info!(database = "postgresql", "Database migrations completed");

    let tokens = TokenAuthenticator::new(config.jwt.secret.as_bytes())
        .with_previous_secrets(config.jwt.previous_secrets.iter());
    let authenticator = Arc::new(Authenticator::new(
        tokens,
        Duration::hours(config.jwt.session_ttl_hours),
    ));

    let user_repository = Arc::new(PostgresUserRepository::new(pg_pool));
    let mailer = Arc::new(HttpMailer::new(&config.mail)?);
    let social_client = Arc::new(HttpSocialAuthClient::new(config.social.providers.clone())?);

    let settings = AccountSettings {
        activation_ttl: Duration::hours(config.jwt.activation_ttl_hours),
        password_reset_ttl: Duration::hours(config.jwt.password_reset_ttl_hours),
        links: match &config.mail.password_reset_page_url {
            Some(page) => {
                LinkBuilder::new(&config.mail.public_base_url).with_password_reset_page(page)
            }
            None => LinkBuilder::new(&config.mail.public_base_url),
        },
        social: SocialPolicy::new(
            config.provider_kinds(),
            config.social.whitelisted_domains.clone(),
        ),
    };

    let account_service = Arc::new(AccountService::new(
        user_repository,
        mailer,
        social_client,
        Arc::clone(&authenticator),
        settings,
    ));

    let http_address = format!("0.0.0.0:{}", config.server.http_port);
    let http_listener = tokio::net::TcpListener::bind(&http_address).await?;
    tracing::info!(
        address = %http_address,
        port = config.server.http_port,
        protocol = "http",
        "Http server listening"
    );

    let http_application = create_router(account_service, authenticator);
    axum::serve(http_listener, http_application).await?;

    tracing::info!("Server exited successfully");
    Ok(())
}
