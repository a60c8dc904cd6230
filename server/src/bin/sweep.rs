//! Invitation sweep.
//!
//! Marks lapsed pending invitations as expired and enqueues the expiry
//! notifications, then exits. Intended to run from cron or a scheduler.

use swimdesk_postgres::invitations::InvitationStore;
use swimdesk_server::Config;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "swimdesk=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env();
    let pool = swimdesk_postgres::connect(&config.database).await?;

    let swept = InvitationStore::new(pool).sweep_expired().await?;
    info!(swept, "invitation sweep complete");
    Ok(())
}
