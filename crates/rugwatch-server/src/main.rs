mod api;
mod middleware;
mod monitor;
mod scheduler;

use std::sync::Arc;

use anyhow::Context as _;
use tracing_subscriber::EnvFilter;

use crate::api::{build_app, AppState};
use crate::monitor::Monitor;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = Arc::new(rugwatch_core::load_app_config()?);
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let pool_config = rugwatch_db::PoolConfig::from_app_config(&config);
    let pool = rugwatch_db::connect_pool(&config.database_url, pool_config).await?;
    rugwatch_db::run_migrations(&pool).await?;

    let bearer_token = config
        .x_bearer_token
        .as_deref()
        .context("X_BEARER_TOKEN must be set to run the monitor daemon")?;
    let x_client = Arc::new(rugwatch_xapi::XApiClient::with_base_url(
        bearer_token,
        config.xapi_request_timeout_secs,
        config.xapi_max_retries,
        config.xapi_retry_backoff_base_ms,
        &config.x_api_base_url,
    )?);

    let list_client = rugwatch_trust::TrustListClient::new(
        &config.trusted_list_url,
        config.xapi_request_timeout_secs,
    )?;
    let cache = Arc::new(rugwatch_trust::TrustedAccountCache::new(
        pool.clone(),
        list_client,
        config.trusted_ttl_hours,
    ));

    tracing::info!(trigger = %config.trigger_phrase, "rugwatch daemon starting");

    let monitor = Arc::new(Monitor::new(
        pool.clone(),
        x_client,
        Arc::clone(&cache),
        Arc::clone(&config),
    ));
    let _scheduler = scheduler::build_scheduler(monitor, cache).await?;

    let app = build_app(AppState { pool });

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to listen for ctrl-c");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("received shutdown signal, starting graceful shutdown");
}
