//! CLI for popsub-sse
//!
//! Loads configuration, applies command-line overrides and serves the
//! subscribe/publish endpoints until Ctrl-C.

use std::sync::Arc;

use clap::Parser;
use popsub_sse::broker::Broker;
use popsub_sse::config::{DEFAULT_CONFIG_PATH, Settings, load_config_from};
use popsub_sse::identity::RandomIdGenerator;
use popsub_sse::transport::{AppState, create_router, serve};
use popsub_sse::utils::logging;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

#[derive(Parser)]
#[command(name = "popsub-sse", about = "Server-sent events pub/sub hub")]
struct Cli {
    /// Configuration file (extension optional)
    #[arg(long, default_value = DEFAULT_CONFIG_PATH)]
    config: String,

    /// Override `server.host`
    #[arg(long)]
    host: Option<String>,

    /// Override `server.port`
    #[arg(long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();

    let mut settings = match load_config_from(&cli.config) {
        Ok(settings) => settings,
        Err(e) => {
            logging::init("info");
            error!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };
    if let Some(host) = cli.host {
        settings.server.host = host;
    }
    if let Some(port) = cli.port {
        settings.server.port = port;
    }

    logging::init(&settings.log.level);

    if let Err(e) = run_server(settings).await {
        error!("Server failed: {}", e);
        std::process::exit(1);
    }
}

async fn run_server(settings: Settings) -> Result<(), Box<dyn std::error::Error>> {
    let broker = Arc::new(Broker::new(
        settings.broker.history_capacity,
        settings.broker.slow_consumer,
    ));
    let shutdown = CancellationToken::new();
    let state = AppState::new(
        &settings,
        broker,
        Arc::new(RandomIdGenerator::new()),
        shutdown.clone(),
    );
    let router = create_router(state, settings.server.static_dir.as_deref());

    let addr = format!("{}:{}", settings.server.host, settings.server.port);
    let listener = TcpListener::bind(&addr).await?;

    let signal = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Shutdown signal received. Closing streams.");
        }
        signal.cancel();
    });

    serve(listener, router, shutdown).await?;
    info!("Server stopped");

    Ok(())
}
