use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use axum::{routing::get, Router};
use tower_http::trace::TraceLayer;
use tracing::{info, warn, Level};

use gatewarden::{
    api::{
        create_application_router, create_reputation_router, create_settings_router,
        ApplicationApiState, ReputationApiState, SettingsApiState,
    },
    store::postgres,
    AppConfig, DisabledWhitelistSync, ExpirationSweeper, HttpWhitelistSync, LogNotifier,
    MemoryStore, PostgresStore, ReputationEngine, Store, VotingEngine, WhitelistSync,
};

#[tokio::main]
async fn main() -> Result<()> {
    let config = AppConfig::from_env().map_err(|e| {
        eprintln!("Configuration error: {}", e);
        e
    })?;

    init_logging(&config)?;

    info!("Starting Gatewarden membership server");
    info!(
        "Voting policy: window={}m, min_votes={}, participation={}%, approval={}%",
        config.voting.window_minutes,
        config.voting.min_votes_required,
        config.voting.min_participation_percent,
        config.voting.approval_threshold_percent
    );

    let store: Arc<dyn Store> = if config.database.postgres_enabled {
        let pool = postgres::pool::connect(
            &config.database.postgres_url,
            config.database.max_connections,
        )
        .await?;
        let store = PostgresStore::new(pool);
        store.init_schema().await?;
        Arc::new(store)
    } else {
        warn!("PostgreSQL disabled, using in-memory store; state is lost on restart");
        Arc::new(MemoryStore::new())
    };

    // Seeds the policy row only if none exists; a running deployment keeps
    // whatever an admin last wrote through the settings endpoint.
    store.seed_settings(&config.voting.to_settings()).await?;

    let whitelist: Arc<dyn WhitelistSync> = if config.whitelist.enabled {
        info!("Whitelist sync enabled: {}", config.whitelist.base_url);
        Arc::new(HttpWhitelistSync::new(
            config.whitelist.base_url.clone(),
            config.whitelist.api_key.clone(),
            config.whitelist.timeout_secs,
        )?)
    } else {
        warn!("Whitelist sync disabled; roster mutations are logged only");
        Arc::new(DisabledWhitelistSync)
    };
    let notifier = Arc::new(LogNotifier);

    let voting_engine = Arc::new(VotingEngine::new(
        store.clone(),
        whitelist.clone(),
        notifier.clone(),
    ));
    let reputation_engine = Arc::new(ReputationEngine::new(
        store.clone(),
        whitelist.clone(),
        notifier.clone(),
    ));

    let sweeper = ExpirationSweeper::new(
        voting_engine.clone(),
        Duration::from_secs(config.sweeper.interval_secs),
    );
    tokio::spawn(sweeper.run());
    info!(
        "Expiration sweeper running every {}s",
        config.sweeper.interval_secs
    );

    let app = Router::new()
        .nest(
            "/applications",
            create_application_router(ApplicationApiState {
                engine: voting_engine.clone(),
            }),
        )
        .nest(
            "/reputation",
            create_reputation_router(ReputationApiState {
                engine: reputation_engine.clone(),
            }),
        )
        .nest(
            "/settings",
            create_settings_router(SettingsApiState {
                store: store.clone(),
            }),
        )
        .route("/health", get(|| async { "OK" }))
        .layer(TraceLayer::new_for_http());

    let bind_addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to bind to {}: {}", bind_addr, e))?;

    info!("Gatewarden listening on {}", bind_addr);
    axum::serve(listener, app).await?;

    Ok(())
}

fn init_logging(config: &AppConfig) -> Result<()> {
    let log_level = match config.logging.level.to_lowercase().as_str() {
        "error" => Level::ERROR,
        "warn" => Level::WARN,
        "info" => Level::INFO,
        "debug" => Level::DEBUG,
        "trace" => Level::TRACE,
        _ => Level::INFO,
    };

    let subscriber = tracing_subscriber::fmt()
        .with_max_level(log_level)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| anyhow::anyhow!("Failed to set logging subscriber: {}", e))?;

    Ok(())
}
