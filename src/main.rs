//! SCIM user simulation MCP server

use clap::Parser;
use scim_sim::{
    access_control::AccessResolver,
    config::{AppConfig, LogFormat, load_config},
    scim::UserService,
    server::ScimMcpHandler,
    transport::run_stdio,
};
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// SCIM user simulation server over MCP
#[derive(Parser, Debug)]
#[command(name = "scim-sim")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, env = "SCIM_SIM_CONFIG")]
    config: Option<String>,

    /// Log level (trace, debug, info, warn, error); defaults to logging.level
    #[arg(long, env = "SCIM_SIM_LOG_LEVEL")]
    log_level: Option<String>,

    /// JSON file with initial users (overrides scim.seed_file)
    #[arg(long, env = "SCIM_SIM_SEED")]
    seed: Option<String>,
}

fn init_logging(config: &AppConfig, cli_level: Option<&str>) {
    let level = cli_level.unwrap_or(config.logging.level.as_str());
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    // stdout carries MCP frames
    let registry = tracing_subscriber::registry().with(filter);
    match config.logging.format {
        LogFormat::Json => registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init(),
        LogFormat::Pretty => registry
            .with(fmt::layer().with_writer(std::io::stderr))
            .init(),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let args = Args::parse();

    let mut config = match load_config(args.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            // logging is not set up yet
            eprintln!("Failed to load configuration: {e}");
            return Err(e.into());
        }
    };
    if let Some(seed) = args.seed {
        config.scim.seed_file = Some(shellexpand::tilde(&seed).into_owned());
    }

    init_logging(&config, args.log_level.as_deref());
    info!(version = env!("CARGO_PKG_VERSION"), "Starting SCIM MCP server");

    let service = UserService::from_config(&config.scim)
        .inspect_err(|e| error!(error = %e, "Failed to initialize user store"))?;

    let access = AccessResolver::new(&config.access_control)
        .inspect_err(|e| error!(error = %e, "Failed to create access resolver"))?;

    let handler = ScimMcpHandler::new(&config, service, access);
    run_stdio(handler).await
}
