//! Doctor command - validate configuration and show status

use anyhow::Result;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tweetbot_adapters::{images::FsImageStore, store::SqliteTweetStore};
use tweetbot_domain::{TweetFilter, TweetStore};

use crate::args::DoctorArgs;
use crate::config::AppConfig;

#[derive(Debug, Serialize)]
struct DoctorReport {
    config: CheckResult,
    database: CheckResult,
    images: CheckResult,
    llm: CheckResult,
    image_generation: CheckResult,
    social: CheckResult,
    overall: Status,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
enum Status {
    Ok,
    Warn,
    Error,
}

impl Status {
    fn symbol(self) -> &'static str {
        match self {
            Status::Ok => "✓",
            Status::Warn => "⚠",
            Status::Error => "✗",
        }
    }
}

#[derive(Debug, Serialize)]
struct CheckResult {
    status: Status,
    message: String,
}

impl CheckResult {
    fn ok(message: impl Into<String>) -> Self {
        Self {
            status: Status::Ok,
            message: message.into(),
        }
    }

    fn warn(message: impl Into<String>) -> Self {
        Self {
            status: Status::Warn,
            message: message.into(),
        }
    }

    fn error(message: impl Into<String>) -> Self {
        Self {
            status: Status::Error,
            message: message.into(),
        }
    }

    fn skipped() -> Self {
        Self::error("Not checked")
    }
}

pub async fn execute(args: DoctorArgs, config_path: Option<PathBuf>) -> Result<()> {
    let mut report = DoctorReport {
        config: CheckResult::skipped(),
        database: CheckResult::skipped(),
        images: CheckResult::skipped(),
        llm: CheckResult::skipped(),
        image_generation: CheckResult::skipped(),
        social: CheckResult::skipped(),
        overall: Status::Error,
    };

    match AppConfig::load(config_path.as_deref()) {
        Ok(config) => {
            report.config = CheckResult::ok("Configuration loaded successfully");
            report.database = check_database(&config.general.database_path).await;
            report.images = check_images_dir(&config.general.images_dir).await;
            report.llm = check_llm(&config);
            report.image_generation = check_image_generation(&config);
            report.social = check_social(&config);
        }
        Err(e) => {
            report.config = CheckResult::error(format!("Failed to load config: {:#}", e));
        }
    }

    let checks = [
        &report.config,
        &report.database,
        &report.images,
        &report.llm,
        &report.image_generation,
        &report.social,
    ];

    report.overall = if checks.iter().any(|c| c.status == Status::Error) {
        Status::Error
    } else if checks.iter().all(|c| c.status == Status::Ok) {
        Status::Ok
    } else {
        Status::Warn
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
    }

    if report.overall == Status::Error {
        std::process::exit(1);
    }

    Ok(())
}

async fn check_database(path: &Path) -> CheckResult {
    let store = match SqliteTweetStore::new(path).await {
        Ok(store) => store,
        Err(e) => return CheckResult::error(format!("{}: {}", path.display(), e)),
    };

    match store.count(&TweetFilter::default()).await {
        Ok(count) => CheckResult::ok(format!("{} ({} tweets)", path.display(), count)),
        Err(e) => CheckResult::error(format!("{}: {}", path.display(), e)),
    }
}

async fn check_images_dir(dir: &Path) -> CheckResult {
    match FsImageStore::new(dir).await {
        Ok(store) => CheckResult::ok(format!("{} (writable)", store.dir().display())),
        Err(e) => CheckResult::error(format!("{}: {}", dir.display(), e)),
    }
}

fn check_llm(config: &AppConfig) -> CheckResult {
    let model = &config.llm.model;

    match config.llm.provider.as_str() {
        "gemini" => check_env(
            &config.llm.gemini.api_key_env,
            &format!("Provider: gemini, Model: {}", model),
        ),
        "stub" => CheckResult::ok("Provider: stub (offline)"),
        other => CheckResult::error(format!("Unknown LLM provider: {}", other)),
    }
}

fn check_image_generation(config: &AppConfig) -> CheckResult {
    let model = &config.image.model;

    match config.image.provider.as_str() {
        "huggingface" => check_env(
            &config.image.huggingface.token_env,
            &format!("Provider: huggingface, Model: {}", model),
        ),
        "stub" => CheckResult::ok("Provider: stub (placeholder image)"),
        other => CheckResult::error(format!("Unknown image provider: {}", other)),
    }
}

fn check_social(config: &AppConfig) -> CheckResult {
    let social = &config.social;

    match social.provider.as_str() {
        "twitter_clone" => {
            let url = check_env(&social.url_env, "URL");
            let key = check_env(&social.api_key_env, "API key");
            let message = format!(
                "Provider: twitter_clone, User: {}, {}; {}",
                social.username, url.message, key.message
            );

            // Posting fails at request time without credentials, the rest still works
            if url.status == Status::Ok && key.status == Status::Ok {
                CheckResult::ok(message)
            } else {
                CheckResult::warn(message)
            }
        }
        "stub" => CheckResult::ok("Provider: stub (nothing is published)"),
        other => CheckResult::error(format!("Unknown social provider: {}", other)),
    }
}

/// Report whether an env var is set without revealing its value
fn check_env(env_var: &str, label: &str) -> CheckResult {
    if env_var.trim().is_empty() {
        return CheckResult::error(format!("{}, no env var configured", label));
    }

    match std::env::var(env_var) {
        Ok(val) if !val.trim().is_empty() => {
            CheckResult::ok(format!("{}, {}: (set)", label, env_var))
        }
        _ => CheckResult::warn(format!("{}, {}: (not set)", label, env_var)),
    }
}

fn print_report(report: &DoctorReport) {
    println!("tweetbot Doctor Report");
    println!("======================");
    println!();

    print_check("Config", &report.config);
    print_check("Database", &report.database);
    print_check("Images", &report.images);
    print_check("LLM Provider", &report.llm);
    print_check("Image Provider", &report.image_generation);
    print_check("Social", &report.social);

    println!();
    println!(
        "{} Overall: {}",
        report.overall.symbol(),
        format!("{:?}", report.overall).to_uppercase()
    );

    if report.overall == Status::Ok {
        println!();
        println!("Ready to run! Try: tweetbot serve");
    }
}

fn print_check(name: &str, result: &CheckResult) {
    println!("{} {}: {}", result.status.symbol(), name, result.message);
}
