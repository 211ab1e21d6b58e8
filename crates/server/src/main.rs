use std::path::Path;

use clap::Parser;
use tracing::info;
use uuid::Uuid;

use iam_server::config::IamConfig;
use iam_server::startup::Bootstrapped;

/// IAM authorization server: evaluates access decisions against a
/// hot-reloaded, in-memory policy cache and records an audit trail.
#[derive(Parser, Debug)]
#[command(name = "iamd", about = "Standalone HTTP server for the IAM authorization decision path")]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(short, long, default_value = "iamd.toml")]
    config: String,

    /// Override the bind host.
    #[arg(long)]
    host: Option<String>,

    /// Override the bind port.
    #[arg(long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let config: IamConfig = if Path::new(&cli.config).exists() {
        let contents = std::fs::read_to_string(&cli.config)?;
        toml::from_str(&contents)?
    } else {
        info!(path = %cli.config, "config file not found, using defaults");
        toml::from_str("")?
    };

    let node_id = Uuid::new_v4().to_string();
    let bootstrapped = Bootstrapped::bootstrap(&config, node_id).await;
    let app = iam_server::api::router(bootstrapped.state.clone());

    let host = cli.host.unwrap_or_else(|| config.server.host.clone());
    let port = cli.port.unwrap_or(config.server.port);
    let addr = format!("{host}:{port}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(address = %addr, "iamd listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("http listener stopped, draining background tasks");
    bootstrapped.shutdown().await;
    info!("iamd shut down");
    Ok(())
}

/// Wait for SIGINT (Ctrl+C) or SIGTERM, then return to trigger graceful
/// shutdown: stop accepting new requests first, then cancel the root
/// context and drain the analytics pipeline (see `startup::Bootstrapped`).
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => { info!("received SIGINT"); }
        () = terminate => { info!("received SIGTERM"); }
    }
}
