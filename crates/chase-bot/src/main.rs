//! Sell-order chaser - Entry Point

use anyhow::Result;
use chase_bot::{AppConfig, AppError, Application};
use chase_engine::RunOutcome;
use clap::Parser;
use tracing::{info, warn};

/// Place a limit sell at a scheduled time and chase the best bid down to a floor.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Configuration file path (TOML, or legacy JSON with a .json extension)
    #[arg(short, long, env = "CHASE_CONFIG", default_value = "config/default.toml")]
    config: String,

    /// Skip the confirmation prompt
    #[arg(short, long)]
    yes: bool,

    /// Ignore the scheduled start time and begin immediately
    #[arg(long)]
    now: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    chase_telemetry::init_logging()?;

    info!("Starting chase-bot v{}", env!("CARGO_PKG_VERSION"));
    info!(config_path = %args.config, "Loading configuration");

    let mut config = AppConfig::load(&args.config)?;
    if args.now {
        config.trading_start_time = None;
    }
    info!(symbol = %config.symbol, "Configuration loaded");

    let app = Application::new(config)?;

    if !args.yes && !app.confirm(std::io::stdin().lock(), std::io::stdout())? {
        warn!("Run declined");
        return Err(AppError::Declined.into());
    }

    app.spawn_signal_handler();

    if !app.wait_for_start().await {
        return Err(AppError::Shutdown.into());
    }

    let summary = app.run().await?;
    match summary.outcome {
        RunOutcome::Completed => info!(remaining = %summary.remaining, "All quantity sold"),
        RunOutcome::ShutDown => info!(
            remaining = %summary.remaining,
            resting_order = ?summary.active_order.map(|o| o.order_id),
            "Stopped by shutdown"
        ),
    }

    Ok(())
}
