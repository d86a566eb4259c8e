mod handlers;

use anyhow::{Context, Result};
use reparto::config::LoggingConfig;
use reparto::{App, Config};
use std::fs::OpenOptions;
use std::sync::Mutex;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    // .env may set REPARTO_CONFIG or RUST_LOG
    dotenvy::dotenv().ok();

    let config = Config::load_default().context("Failed to load configuration")?;
    init_logging(&config.logging)?;

    let app = handlers::register(App::from_config(&config)).context("Failed to register routes")?;
    info!(
        database = %app.dao().store().path().display(),
        commit_policy = ?config.database.commit_policy,
        routes = app.router().len(),
        "reparto starting"
    );

    let router = app.into_axum_router().layer(TraceLayer::new_for_http());

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!(address = %listener.local_addr()?, "listening for connections");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("shutdown complete");
    Ok(())
}

/// Installs the global subscriber: `RUST_LOG` wins over `[logging] level`,
/// and `[logging] file` redirects output from stdout to that file
fn init_logging(logging: &LoggingConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&logging.level))
        .with_context(|| format!("Invalid log level {:?}", logging.level))?;

    let file_layer = match &logging.file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file {:?}", path))?;
            Some(
                tracing_subscriber::fmt::layer()
                    .with_writer(Mutex::new(file))
                    .with_ansi(false),
            )
        }
        None => None,
    };
    let stdout_layer = file_layer
        .is_none()
        .then(tracing_subscriber::fmt::layer);

    tracing_subscriber::registry()
        .with(filter)
        .with(file_layer)
        .with(stdout_layer)
        .try_init()
        .context("Failed to install tracing subscriber")?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(error = %err, "failed to listen for ctrl-c; shutting down");
    }
    info!("shutdown signal received");
}
