//! HTTP surface over the tweet service
//!
//! Routes:
//! - `POST /tweet/generate-tweet`
//! - `POST /tweet/post-tweet/{tweet_id}`
//! - `PUT /tweet/edit/{tweet_id}`
//! - `GET /tweet/tweets`
//! - `GET /tweet/tweet/{tweet_id}`
//! - `GET|POST /tweet/image-generate/{tweet_id}`
//! - `GET|DELETE /tweet/image/{tweet_id}`
//! - `GET /health`

mod error;
mod routes;

use anyhow::{Context, Result};
use axum::{
    Router,
    http::HeaderValue,
    routing::{get, post, put},
};
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tower::ServiceBuilder;
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

use crate::config::ServerConfig;
use crate::wiring::DynTweetService;

/// Shared handler state
pub type AppState = Arc<DynTweetService>;

/// Build the API router with tracing, CORS and timeout layers
pub fn build_router(state: AppState, server: &ServerConfig) -> Result<Router> {
    let cors = build_cors(server)?;

    let router = Router::new()
        .route("/", get(routes::root))
        .route("/health", get(routes::health))
        .route("/tweet/generate-tweet", post(routes::generate_tweet))
        .route("/tweet/post-tweet/{tweet_id}", post(routes::post_tweet))
        .route("/tweet/edit/{tweet_id}", put(routes::edit_tweet))
        .route("/tweet/tweets", get(routes::list_tweets))
        .route("/tweet/tweet/{tweet_id}", get(routes::get_tweet))
        .route(
            "/tweet/image-generate/{tweet_id}",
            get(routes::generate_image).post(routes::generate_image),
        )
        .route(
            "/tweet/image/{tweet_id}",
            get(routes::get_image).delete(routes::delete_image),
        )
        .layer(
            ServiceBuilder::new()
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                        .on_response(DefaultOnResponse::new().level(Level::INFO)),
                )
                .layer(cors)
                .layer(TimeoutLayer::new(Duration::from_secs(
                    server.request_timeout_secs,
                ))),
        )
        .with_state(state);

    Ok(router)
}

fn build_cors(server: &ServerConfig) -> Result<CorsLayer> {
    if server.cors_is_permissive() {
        return Ok(CorsLayer::permissive());
    }

    let origins = server
        .cors_origins
        .iter()
        .map(|origin| {
            HeaderValue::from_str(origin.trim())
                .with_context(|| format!("Invalid CORS origin: {}", origin))
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods(Any)
        .allow_headers(Any))
}

/// Serve the router until Ctrl+C or SIGTERM
pub async fn serve(router: Router, bind: &str) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(bind)
        .await
        .with_context(|| format!("Failed to bind {}", bind))?;

    tracing::info!(bind = %bind, "tweetbot HTTP server listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server failed")?;

    tracing::info!("tweetbot HTTP server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => tracing::info!("Received Ctrl+C, shutting down gracefully"),
        () = terminate => tracing::info!("Received SIGTERM, shutting down gracefully"),
    }
}
