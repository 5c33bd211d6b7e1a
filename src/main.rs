use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tracing::info;
use tracing_subscriber::EnvFilter;

use gatekeeper::auth::AuthGate;
use gatekeeper::clock::{Clock, SystemClock};
use gatekeeper::config::{GatekeeperConfig, LogFormat};
use gatekeeper::grpc::{spawn_window_sweeper, GatewayServer};
use gatekeeper::token::{SigningKey, MIN_KEY_BYTES};

#[derive(Parser, Debug)]
#[command(name = "gatekeeper", version, about = "Token authentication and rate limiting gateway")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the gateway
    Serve {
        /// YAML configuration file; GATEKEEPER__* environment variables override it
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
    /// Print a random signing key for auth.secret_key
    Keygen {
        /// Number of random bytes (at least 16)
        #[arg(
            long,
            default_value_t = 32,
            value_parser = clap::builder::RangedU64ValueParser::<usize>::new().range(MIN_KEY_BYTES as u64..)
        )]
        bytes: usize,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    match Cli::parse().command {
        Command::Keygen { bytes } => {
            println!("{}", SigningKey::generate_encoded(bytes)?);
            Ok(())
        }
        Command::Serve { config } => serve(config).await,
    }
}

async fn serve(config_path: Option<PathBuf>) -> anyhow::Result<()> {
    // Any configuration fault stops startup here; the gate never runs open.
    let config = GatekeeperConfig::load(config_path.as_deref())?;
    init_tracing(&config);

    info!("Starting Gatekeeper");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));
    info!(grpc_addr = %config.server.grpc_addr, "Configuration loaded");

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let gate = AuthGate::from_config(&config)?;

    let sweeper = spawn_window_sweeper(
        Arc::clone(gate.limiter()),
        Arc::clone(&clock),
        Duration::from_secs(config.server.sweep_interval_secs),
    );

    let server = GatewayServer::new(config.server.grpc_addr, gate, clock);

    // Run the server with graceful shutdown on Ctrl+C
    server.serve_with_shutdown(shutdown_signal()).await?;
    sweeper.abort();

    info!("Gatekeeper stopped");
    Ok(())
}

fn init_tracing(config: &GatekeeperConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.server.log_level));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(true);

    match config.server.log_format {
        LogFormat::Text => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
}

/// Wait for a shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating graceful shutdown");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating graceful shutdown");
        }
    }
}
