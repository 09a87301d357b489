//! Config command - write an example configuration

use anyhow::{Context, Result, bail};
use std::path::PathBuf;
use tokio::fs;

use crate::args::{ConfigArgs, ConfigCommands};
use crate::config::AppConfig;

pub async fn execute(args: ConfigArgs) -> Result<()> {
    match args.command {
        ConfigCommands::Init { path, force } => init_config(path, force).await,
    }
}

async fn init_config(path: PathBuf, force: bool) -> Result<()> {
    if fs::try_exists(&path).await.unwrap_or(false) && !force {
        bail!(
            "Config file already exists: {}. Use --force to overwrite.",
            path.display()
        );
    }

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .await
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }

    fs::write(&path, AppConfig::example_toml())
        .await
        .with_context(|| format!("Failed to write config file: {}", path.display()))?;

    tracing::debug!(path = %path.display(), "Wrote example config");

    println!("Created config file: {}", path.display());
    println!();
    println!("Next steps:");
    println!("  1. Pick providers and the images directory in the config file");
    println!("  2. Export GEMINI_API_KEY, HUGGINGFACE_TOKEN, TWITTER_CLONE_URL and TWITTER_CLONE_API_KEY");
    println!("  3. Run 'tweetbot doctor' to validate your setup");
    println!("  4. Run 'tweetbot serve' to start the API");

    Ok(())
}
