//! Tap To Smile admin API server

use std::sync::Arc;

use anyhow::Context;
use taptosmile_api::{
    config::{Config, LogFormat},
    create_router,
    email::{EmailConfig, NotificationSender, ResendNotifier},
    email_check::{AcceptAllMailDomains, DnsMailDomainVerifier, MailDomainVerifier},
    store::PgCredentialStore,
    AppState,
};
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // .env is optional; real deployments set the environment directly
    let _ = dotenvy::dotenv();

    let config = Config::from_env().context("Failed to load configuration")?;
    init_tracing(config.log_format);

    let pool = taptosmile_shared::create_pool(&config.database_url, config.database_max_connections)
        .await
        .context("Failed to create database pool")?;
    tracing::info!("Database pool created");

    taptosmile_shared::run_migrations(&pool)
        .await
        .context("Failed to run database migrations")?;
    tracing::info!("Database migrations applied");

    let email_config = EmailConfig::from_config(&config);
    if !email_config.is_enabled() {
        tracing::warn!("RESEND_API_KEY not set, password reset emails will not be delivered");
    }
    let notifier: Arc<dyn NotificationSender> = Arc::new(ResendNotifier::new(email_config));

    let mail_domains: Arc<dyn MailDomainVerifier> = if config.check_email_deliverability {
        Arc::new(DnsMailDomainVerifier::new())
    } else {
        Arc::new(AcceptAllMailDomains)
    };

    let bind_address = config.bind_address.clone();
    let state = AppState::new(
        config,
        Arc::new(PgCredentialStore::new(pool)),
        notifier,
        mail_domains,
    );
    let app = create_router(state);

    let listener = TcpListener::bind(&bind_address)
        .await
        .with_context(|| format!("Failed to bind {bind_address}"))?;
    tracing::info!(address = %bind_address, "Admin API listening");

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    tracing::info!("Server stopped");
    Ok(())
}

fn init_tracing(format: LogFormat) {
    // Defaults to info level for our crate if RUST_LOG is not set
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "taptosmile_api=info,audit=info,tower_http=info".into());

    let json_layer = (format == LogFormat::Json)
        .then(|| tracing_subscriber::fmt::layer().json().flatten_event(true));
    let text_layer = (format == LogFormat::Pretty).then(tracing_subscriber::fmt::layer);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(json_layer)
        .with(text_layer)
        .init();
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
