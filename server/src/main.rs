//! Swimdesk HTTP server.
//!
//! Connects to Postgres, applies migrations, starts the outbox notifier,
//! and serves the API until SIGINT/SIGTERM.

use swimdesk_postgres::outbox::OutboxStore;
use swimdesk_server::email::Notifier;
use swimdesk_server::server::{AppState, build_router};
use swimdesk_server::{Config, notifier};
use tokio::signal;
use tokio::sync::broadcast;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "swimdesk=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting swimdesk server");

    let config = Config::from_env();
    info!(
        host = %config.server.host,
        port = config.server.port,
        smtp = config.smtp.is_some(),
        "Configuration loaded"
    );

    let pool = swimdesk_postgres::connect(&config.database).await?;
    swimdesk_postgres::run_migrations(&pool).await?;
    info!("Database connected, migrations applied");

    let (shutdown_tx, _) = broadcast::channel(1);

    // Outbox notifier runs alongside the HTTP server; every email leaves
    // through it.
    let email_backend = Notifier::from_config(config.smtp.as_ref());
    let notifier_handle = tokio::spawn(notifier::run(
        OutboxStore::new(pool.clone()),
        email_backend,
        config.notifier.clone(),
        shutdown_tx.subscribe(),
    ));

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let state = AppState::new(pool, config);
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(address = %addr, "Server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("HTTP server stopped, shutting down notifier");
    let _ = shutdown_tx.send(());
    let _ = notifier_handle.await;

    info!("Server stopped");
    Ok(())
}

/// Resolves on Ctrl+C (SIGINT) or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(error) = signal::ctrl_c().await {
            tracing::error!(%error, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(error) => {
                tracing::error!(%error, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => info!("Received Ctrl+C, shutting down"),
        () = terminate => info!("Received SIGTERM, shutting down"),
    }
}
