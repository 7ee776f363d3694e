use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use storefront_auth::{
    config::Config,
    db::{connection::create_pool, redis::create_redis_pool},
    repositories::{PgSessionStore, PgUserStore},
    router::build_router,
    services::{run_sweeper, AuthService, RedisSessionCache, SessionCache, SessionService},
    state::AppState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "storefront_auth=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::load()?;
    tracing::info!(
        session_timeout_minutes = config.session_timeout_minutes,
        max_sessions_per_user = config.max_sessions_per_user,
        sweep_interval_seconds = config.session_sweep_interval_seconds,
        caching = config.redis_url.is_some(),
        "Loaded configuration from environment/.env"
    );

    // Initialize database
    let pool = create_pool(&config.database_url).await?;
    sqlx::migrate!("./migrations").run(&pool).await?;

    // Session cache is optional; without Redis every validation hits Postgres.
    let cache: Option<Arc<dyn SessionCache>> = create_redis_pool(&config)
        .await?
        .map(|pool| Arc::new(RedisSessionCache::new(pool)) as Arc<dyn SessionCache>);

    let session_store = Arc::new(PgSessionStore::new(pool.clone()));
    let user_store = Arc::new(PgUserStore::new(pool));

    let sessions = Arc::new(SessionService::new(
        session_store,
        cache,
        config.session_timeout(),
        config.max_sessions_per_user,
    ));
    let auth = Arc::new(AuthService::new(user_store.clone(), sessions.clone()));

    // Background sweep keeps the expired-session backlog bounded.
    tokio::spawn(run_sweeper(sessions.clone(), config.sweep_interval()));

    let state = AppState::new(config.clone(), auth, sessions, user_store);
    let app = build_router(state);

    // Start server
    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    tracing::info!("Server listening on {}", config.bind_addr);
    axum::serve(listener, app).await?;

    Ok(())
}
