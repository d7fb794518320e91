mod config;
mod observability;

use cart_extension::config::{ServiceConfig, TelemetryConfig};
use cart_extension::errors::CartExtensionError;
use clap::Parser;
use config::{Config, ConfigError};
use observability::ObservabilityError;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

/// Cart validation webhook with best-effort telemetry relay
#[derive(Parser)]
#[command(version, about)]
enum CliCommand {
    /// Serve the API extension endpoint
    Run {
        /// Path to the YAML service config. Built-in defaults apply when omitted.
        #[arg(long, short)]
        config: Option<PathBuf>,
    },
    /// Load and validate the service config and telemetry environment, then exit
    CheckConfig {
        #[arg(long, short)]
        config: Option<PathBuf>,
    },
}

#[derive(thiserror::Error, Debug)]
enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("telemetry environment: {0}")]
    Telemetry(#[from] cart_extension::errors::ConfigError),
    #[error(transparent)]
    Observability(#[from] ObservabilityError),
    #[error("could not start runtime: {0}")]
    Runtime(#[from] std::io::Error),
    #[error("service stopped: {0}")]
    Service(#[from] CartExtensionError),
}

fn main() -> ExitCode {
    let cli = CliCommand::parse();

    let result = match &cli {
        CliCommand::Run { config } => run(config.as_deref()),
        CliCommand::CheckConfig { config } => check_config(config.as_deref()),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("cartguard: {e}");
            ExitCode::FAILURE
        }
    }
}

fn load_config(path: Option<&Path>) -> Result<Config, ConfigError> {
    match path {
        Some(path) => Config::from_file(path),
        None => Ok(Config::default()),
    }
}

fn check_config(path: Option<&Path>) -> Result<(), StartupError> {
    let config = load_config(path)?;
    let telemetry = TelemetryConfig::from_env()?;
    println!("{config:#?}\n{telemetry:#?}");
    Ok(())
}

fn run(path: Option<&Path>) -> Result<(), StartupError> {
    let config = load_config(path)?;
    let telemetry = TelemetryConfig::from_env()?;

    let _sentry_guard = observability::init_logging(&config.logging)?;
    if let Some(metrics) = &config.metrics {
        observability::init_metrics(metrics)?;
    }

    let service_config = ServiceConfig {
        listener: config.listener,
        admin_listener: config.admin_listener,
        telemetry,
    };

    tracing::info!(
        listener = %format!("{}:{}", service_config.listener.host, service_config.listener.port),
        admin_listener = %format!("{}:{}", service_config.admin_listener.host, service_config.admin_listener.port),
        "Starting cartguard"
    );

    let rt = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    rt.block_on(cart_extension::run(service_config))?;

    Ok(())
}
