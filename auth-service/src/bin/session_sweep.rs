//! One-shot sweep for deployments that schedule expiry from cron instead
//! of the in-process background task.

use std::sync::Arc;

use storefront_auth::{
    config::Config, db::connection::create_pool, repositories::PgSessionStore,
    services::SessionService,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let config = Config::load()?;
    let pool = create_pool(&config.database_url).await?;

    let sessions = SessionService::new(
        Arc::new(PgSessionStore::new(pool)),
        None,
        config.session_timeout(),
        config.max_sessions_per_user,
    );

    let swept = sessions.sweep_expired().await?;
    if swept > 0 {
        tracing::info!("Marked {} overdue sessions as expired", swept);
    }

    Ok(())
}
