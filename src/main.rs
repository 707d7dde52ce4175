//! climate-board - version 0.1.0
//!
//! Terminal dashboard for room climate readings with tracing logging.
//! This is the main entry point that starts the background tasks and handles subcommands.

mod cli;
mod commands;

use clap::Parser;
use chrono::Local;
use std::sync::Arc;
use tokio::{signal, sync::watch};
use tracing::{debug, error, info, Level};

use cli::{resolve_config, Args, Commands};
use climate_board::config::{show_config, validate_effective_config, Config};
use climate_board::dashboard::{DashboardState, StateStore};
use climate_board::poller::{run_clock_task, run_refresh_task};
use climate_board::render::OutputFormat;
use climate_board::source::MetricsSource;
use commands::{command_check, command_config, command_once, command_parse, command_query};

/// Initializes tracing logging subsystem with configured log level.
///
/// Logs go to stderr; stdout belongs to the dashboard frames.
fn setup_logging(config: &Config) {
    let log_level = match config.log_level() {
        "off" => None,
        "error" => Some(Level::ERROR),
        "info" => Some(Level::INFO),
        "debug" => Some(Level::DEBUG),
        "trace" => Some(Level::TRACE),
        _ => Some(Level::WARN),
    };

    let Some(log_level) = log_level else {
        return;
    };

    let subscriber = tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(true)
        .with_line_number(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("Failed to set tracing subscriber");

    info!("Logging initialized with level: {}", config.log_level());
}

/// Helper function to load and validate configuration.
/// Exits the process with error code 1 if validation fails.
fn load_validated_config(args: &Args) -> Result<Config, Box<dyn std::error::Error>> {
    let config = resolve_config(args)?;
    if let Err(e) = validate_effective_config(&config) {
        eprintln!("❌ Configuration invalid: {}", e);
        std::process::exit(1);
    }
    Ok(config)
}

/// Resolves on SIGINT or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received SIGINT (Ctrl+C), shutting down gracefully...");
        }
        _ = terminate => {
            info!("Received SIGTERM, shutting down gracefully...");
        }
    }
}

/// Runs the live dashboard until a shutdown signal arrives.
async fn run_dashboard(
    config: Config,
    format: OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    let source = MetricsSource::from_config(&config)?;
    let tick = config.tick();
    let interval = config.refresh_interval();

    info!(
        "Starting climate-board: source={}, refresh every {:?}, tick {:?}",
        source.describe(),
        interval,
        tick
    );

    let config = Arc::new(config);
    let store = Arc::new(StateStore::new(DashboardState::new(Local::now())));
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let refresh = tokio::spawn(run_refresh_task(
        store.clone(),
        source,
        tick,
        interval,
        shutdown_rx.clone(),
    ));
    let clock = tokio::spawn(run_clock_task(
        store.clone(),
        config.clone(),
        format,
        tick,
        shutdown_rx,
    ));

    shutdown_signal().await;
    let _ = shutdown_tx.send(true);

    for (name, handle) in [("refresh", refresh), ("clock", clock)] {
        if let Err(e) = handle.await {
            error!("{} task ended abnormally: {}", name, e);
        }
    }

    let state = store.snapshot().await;
    debug!(
        "Final state: last refresh {:?}, {} consecutive failures",
        state.last_refresh_at, state.consecutive_failures
    );
    info!("climate-board stopped gracefully");
    Ok(())
}

/// Main application entry point.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    // Early config resolution for show/check modes
    if args.show_config || args.check_config {
        let config = resolve_config(&args)?;

        if args.check_config {
            if let Err(e) = validate_effective_config(&config) {
                eprintln!("❌ Configuration invalid: {}", e);
                std::process::exit(1);
            }
            println!("✅ Configuration is valid");
            return Ok(());
        }

        return show_config(&config, args.config_format);
    }

    // Commands that work without a validated config
    match &args.command {
        Some(Commands::Config {
            output,
            format,
            commented,
        }) => {
            return command_config(output.clone(), *format, *commented);
        }
        Some(Commands::Parse { file, format }) => {
            return command_parse(file.as_deref(), *format);
        }
        Some(Commands::Check) => {
            let config = resolve_config(&args)?;
            setup_logging(&config);
            return command_check(&config).await;
        }
        _ => {}
    }

    let config = load_validated_config(&args)?;
    setup_logging(&config);

    match &args.command {
        Some(Commands::Once) => command_once(&config, args.format).await,
        Some(Commands::Query {
            metric,
            label,
            value,
            file,
        }) => command_query(metric, label, value, file.as_deref(), &config).await,
        _ => run_dashboard(config, args.format).await,
    }
}
