//! tweetbot CLI entry point

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

mod args;
mod commands;
mod config;
mod http;
mod wiring;

use args::{Cli, Commands, LogFormat};
use config::AppConfig;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // --log-level wins over general.log_level; RUST_LOG wins over both
    let log_level = match cli.log_level.clone() {
        Some(level) => level,
        None => AppConfig::load(cli.config.as_deref())
            .map(|c| c.general.log_level)
            .unwrap_or_else(|_| "info".to_string()),
    };
    init_logging(&log_level, cli.log_format)?;

    match cli.command {
        Commands::Serve(args) => commands::serve::execute(args, cli.config).await,
        Commands::Generate(args) => commands::generate::execute(args, cli.config).await,
        Commands::Config(args) => commands::config::execute(args).await,
        Commands::Doctor(args) => commands::doctor::execute(args, cli.config).await,
    }
}

fn init_logging(level: &str, format: LogFormat) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(level))?;

    let registry = tracing_subscriber::registry().with(filter);

    match format {
        LogFormat::Text => registry
            .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
            .init(),
        LogFormat::Json => registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init(),
    }

    Ok(())
}
