use std::{net::SocketAddr, sync::Arc};

use anyhow::Context;
use db::DBService;
use server::{AppState, routes};
use services::services::{
    auto_fold::AutoFoldService, config::SchedulerConfig, push::ExpoPushClient,
};
use tracing::info;
use tracing_subscriber::{EnvFilter, prelude::*};
use utils::sentry::{init_once, sentry_layer};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = SchedulerConfig::from_env()?;

    let _sentry = init_once(config.sentry_dsn.as_deref());
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_filter(env_filter))
        .with(sentry_layer())
        .init();

    let db = DBService::new(&config.database_url)
        .await
        .with_context(|| format!("failed to open database {}", config.database_url))?;
    let notifier = ExpoPushClient::new(config.expo_access_token.clone())?;

    if let Some(interval) = config.auto_fold_interval {
        AutoFoldService::spawn(db.clone(), interval, config.weekly_anchor);
    }

    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .with_context(|| format!("invalid listen address {}:{}", config.host, config.port))?;
    let state = AppState::new(db, Arc::new(notifier), config);
    let app = routes::router(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Scheduler listening on http://{}", listener.local_addr()?);
    axum::serve(listener, app).await?;
    Ok(())
}
