use std::time::Duration;

use anyhow::Context as _;
use sea_orm::{ConnectOptions, Database};
use tracing::info;

use ases_auth::config::AuthConfig;
use ases_auth::infra::mail::Notifier;
use ases_auth::router::build_router;
use ases_auth::state::AppState;
use ases_auth_types::identity::SessionSecret;
use ases_core::tracing::init_tracing;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = AuthConfig::from_env()?;

    let mut options = ConnectOptions::new(&config.database_url);
    options
        .max_connections(config.db_pool.max_connections)
        .acquire_timeout(Duration::from_secs(config.db_pool.acquire_timeout_secs))
        .sqlx_logging(false);
    let db = Database::connect(options)
        .await
        .context("failed to connect to database")?;

    let notifier = Notifier::from_config(&config.mail).context("invalid mail configuration")?;
    if matches!(notifier, Notifier::Log(_)) {
        tracing::warn!("SMTP_HOST not set; one-time passcodes are written to the log");
    }

    let state = AppState {
        db,
        session_secret: SessionSecret::new(config.jwt_secret),
        notifier,
        mail_timeout: Duration::from_secs(config.mail.timeout_secs),
    };

    let router = build_router(state);
    let addr = format!("0.0.0.0:{}", config.auth_port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    info!("auth service listening on {addr}");
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
    }
    info!("shutdown signal received");
}
