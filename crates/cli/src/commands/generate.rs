//! Generate command - one-shot tweet generation

use anyhow::{Context, Result};
use serde::Serialize;
use std::path::PathBuf;

use crate::args::GenerateArgs;
use crate::config::AppConfig;
use crate::wiring::build_service;

#[derive(Debug, Serialize)]
struct GenerateOutput {
    id: i64,
    topic: String,
    tweet: String,
    image: Option<String>,
}

pub async fn execute(args: GenerateArgs, config_path: Option<PathBuf>) -> Result<()> {
    let config = AppConfig::load(config_path.as_deref())?;
    let service = build_service(&config).await?;

    let generated = service
        .generate(&args.topic)
        .await
        .context("Tweet generation failed")?;

    let output = GenerateOutput {
        id: generated.id,
        topic: generated.topic,
        tweet: generated.content,
        image: generated.image_path,
    };

    if args.json {
        let json = serde_json::to_string_pretty(&output).context("Failed to serialize output")?;
        println!("{}", json);
    } else {
        println!("Tweet #{} ({})", output.id, output.topic);
        println!();
        println!("{}", output.tweet);
        if let Some(image) = &output.image {
            println!();
            println!("Image: {}", image);
        }
    }

    Ok(())
}
