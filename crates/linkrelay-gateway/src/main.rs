use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tracing::info;

use linkrelay_core::LinkrelayConfig;
use linkrelay_pipeline::HttpShortener;
use linkrelay_store::{db, SqliteLinkLog, SqliteSettingsStore};
use linkrelay_telegram::TelegramMessenger;

mod app;
mod dedup;
mod http;
mod worker;

/// Telegram bot that replaces links with shortened ones.
#[derive(Debug, Parser)]
#[command(name = "linkrelay", version, about)]
struct Cli {
    /// Config file (default: $LINKRELAY_CONFIG, then ./linkrelay.toml).
    #[arg(short, long)]
    config: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env is fine.
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "linkrelay=info,linkrelay_pipeline=info,linkrelay_telegram=info,tower_http=info".into()
            }),
        )
        .init();

    let cli = Cli::parse();

    // explicit path > LINKRELAY_CONFIG > ./linkrelay.toml
    let config_path = cli
        .config
        .or_else(|| std::env::var("LINKRELAY_CONFIG").ok());
    let config = LinkrelayConfig::load(config_path.as_deref())?;

    let db_path = &config.database.path;
    ensure_parent_dir(db_path);
    info!(path = %db_path, "opening SQLite database");
    db::init_db(&db::open(db_path)?)?;

    // one connection per store
    let settings = SqliteSettingsStore::new(db::open(db_path)?);
    let links = SqliteLinkLog::new(db::open(db_path)?);
    info!(links = links.total()?, "database ready");

    let shortener = HttpShortener::new(
        config.shortener.base_url.as_str(),
        Duration::from_secs(config.shortener.timeout_secs),
    )?;
    let messenger = TelegramMessenger::new(&config.telegram)?;

    let services = Arc::new(app::Services {
        settings,
        links,
        shortener,
        messenger,
    });

    let (queue_tx, queue_rx) = tokio::sync::mpsc::channel(config.workers.queue_capacity);
    let workers = tokio::spawn(worker::run(
        services,
        queue_rx,
        config.workers.max_concurrency,
    ));

    let state = Arc::new(app::AppState::new(
        config.gateway.webhook_secret.clone(),
        queue_tx,
        config.workers.dedup_window,
    ));
    let router = app::build_router(state);

    let addr: SocketAddr = format!("{}:{}", config.gateway.bind, config.gateway.port).parse()?;
    info!("linkrelay listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // The router (and with it the queue sender) is gone; let the pool drain.
    workers.await?;
    info!("shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "failed to listen for ctrl-c");
        std::future::pending::<()>().await;
    }
    info!("shutdown requested");
}

fn ensure_parent_dir(path: &str) {
    if let Some(parent) = std::path::Path::new(path).parent() {
        let _ = std::fs::create_dir_all(parent);
    }
}
