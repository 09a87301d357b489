//! Serve command - run the HTTP API

use anyhow::Result;
use std::path::PathBuf;
use std::sync::Arc;

use crate::args::ServeArgs;
use crate::config::AppConfig;
use crate::http;
use crate::wiring::build_service;

pub async fn execute(args: ServeArgs, config_path: Option<PathBuf>) -> Result<()> {
    let config = AppConfig::load(config_path.as_deref())?;
    let bind = args.bind.unwrap_or_else(|| config.server.bind.clone());

    let mut server = config.server.clone();
    server.request_timeout_secs = config.effective_request_timeout_secs();
    if server.request_timeout_secs > config.server.request_timeout_secs {
        tracing::warn!(
            configured = config.server.request_timeout_secs,
            effective = server.request_timeout_secs,
            "Request timeout is below the collaborator timeouts, raising it"
        );
    }

    tracing::info!(
        bind = %bind,
        cors_origins = ?server.cors_origins,
        request_timeout_secs = server.request_timeout_secs,
        "Starting tweetbot"
    );

    let service = Arc::new(build_service(&config).await?);
    let router = http::build_router(service, &server)?;

    http::serve(router, &bind).await
}
