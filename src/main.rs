mod types;
mod backend;
mod config;
mod ui;
mod web;

use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};
use std::sync::Arc;
use tracing::{error, info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use backend::{Backend, BackendClient};
use config::ConsoleConfig;
use ui::{CardStatus, DashboardController};
use web::{start_console_server, AppState, DashboardPoller};

#[derive(Parser)]
#[command(name = "strategy-console")]
#[command(version = "0.1.0")]
#[command(about = "Web console for a trading-strategy backend", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path
    #[arg(short, long, default_value = "console.toml")]
    config: String,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the console (dashboard, API keys, strategy creation)
    Serve {
        /// Console port (overrides the configured listen_port)
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Fetch the dashboard once and print a summary
    Status,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    if dotenvy::dotenv().is_ok() {
        info!("Loaded environment from .env");
    }

    let config = ConsoleConfig::load(&cli.config)?;
    info!("Strategy Console v0.1.0");

    match cli.command {
        Commands::Serve { port } => {
            run_console(config, port).await?;
        }
        Commands::Status => {
            show_status(&config).await?;
        }
    }

    Ok(())
}

async fn run_console(config: ConsoleConfig, port: Option<u16>) -> Result<()> {
    let client = BackendClient::from_config(&config)?;
    info!("Using backend at {}", client.base_url());
    let backend: Arc<dyn Backend> = Arc::new(client);
    let state = AppState::new(backend.clone(), config.poll_interval_secs);

    let controller = Arc::new(DashboardController::new(backend));
    let poller = DashboardPoller::new(controller, state.dashboard.clone(), config.poll_interval());
    let poller_handle = poller.spawn();

    let port = port.unwrap_or(config.listen_port);
    let result = start_console_server(state, port).await;

    poller_handle.abort();
    if let Err(e) = &result {
        error!("Console server stopped: {}", e);
    }
    result
}

async fn show_status(config: &ConsoleConfig) -> Result<()> {
    let client = BackendClient::from_config(config)?;
    info!("Checking backend at {}", client.base_url());
    let backend: Arc<dyn Backend> = Arc::new(client);
    let controller = DashboardController::new(backend);

    let data = controller
        .fetch()
        .await
        .map_err(|e| anyhow!("Backend unreachable: {}", e.user_message("server error")))?;

    if data.strategies_data.is_empty() {
        info!("No strategies configured");
        return Ok(());
    }

    info!("{} strategies", data.strategies_data.len());
    for item in &data.strategies_data {
        let status = CardStatus::from_state(item.active_state.as_ref());
        let cfg = &item.strategy_config;
        info!("  {} [{}] {}", cfg.strategy_name, cfg.trading_pair, status.label());

        if let Some(err) = item.active_state.as_ref().and_then(|s| s.last_error.as_deref()) {
            warn!("    last error: {}", err);
        }
    }

    Ok(())
}
