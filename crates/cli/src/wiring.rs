//! Builds the tweet service from configuration

use anyhow::{Context, Result, bail};
use secrecy::SecretString;
use std::sync::Arc;
use tweetbot_adapters::{
    imagegen::{
        HuggingFaceConfig as AdapterImageConfig, HuggingFaceImageGenerator, StubImageGenerator,
    },
    images::FsImageStore,
    llm::{GeminiWriter, LlmConfig as AdapterLlmConfig, StubWriter},
    social::{StubSocialPublisher, TwitterClonePublisher, UnconfiguredPublisher},
    store::SqliteTweetStore,
};
use tweetbot_domain::{
    Clock, ImageGenerator, ImageStore, SocialPublisher, SystemClock, TweetStore, TweetWriter,
    usecases::{TweetService, TweetServiceConfig},
};

use crate::config::AppConfig;

/// Tweet service over trait objects, as assembled by the binary
pub type DynTweetService = TweetService<
    dyn TweetStore,
    dyn TweetWriter,
    dyn ImageGenerator,
    dyn ImageStore,
    dyn SocialPublisher,
    dyn Clock,
>;

/// Open storage and build every adapter named by the configuration
pub async fn build_service(config: &AppConfig) -> Result<DynTweetService> {
    let store: Arc<dyn TweetStore> = Arc::new(
        SqliteTweetStore::new(&config.general.database_path)
            .await
            .context("Failed to initialize SQLite tweet store")?,
    );

    let image_store: Arc<dyn ImageStore> = Arc::new(
        FsImageStore::new(&config.general.images_dir)
            .await
            .with_context(|| {
                format!(
                    "Failed to initialize images directory: {}",
                    config.general.images_dir.display()
                )
            })?,
    );

    let writer = build_writer(config)?;
    let image_generator = build_image_generator(config)?;
    let publisher = build_publisher(config)?;

    tracing::info!(
        llm = %config.llm.provider,
        image = %config.image.provider,
        social = publisher.platform(),
        database = %config.general.database_path.display(),
        "Tweet service ready"
    );

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);

    Ok(TweetService::new(
        store,
        writer,
        image_generator,
        image_store,
        publisher,
        clock,
        TweetServiceConfig {
            max_page_limit: config.server.max_page_limit,
        },
    ))
}

pub(crate) fn build_writer(config: &AppConfig) -> Result<Arc<dyn TweetWriter>> {
    match config.llm.provider.as_str() {
        "gemini" => {
            let api_key = load_api_key(&config.llm.gemini.api_key_env, "gemini")?;
            let writer = GeminiWriter::with_base_url(
                api_key,
                config.llm.gemini.base_url.clone(),
                adapter_llm_config(config),
            )?;
            Ok(Arc::new(writer))
        }
        "stub" => Ok(Arc::new(StubWriter::echo())),
        other => bail!("Unknown LLM provider: {}", other),
    }
}

pub(crate) fn build_image_generator(config: &AppConfig) -> Result<Arc<dyn ImageGenerator>> {
    match config.image.provider.as_str() {
        "huggingface" => {
            let token = load_api_key(&config.image.huggingface.token_env, "huggingface")?;
            let generator = HuggingFaceImageGenerator::with_base_url(
                token,
                config.image.huggingface.base_url.clone(),
                AdapterImageConfig {
                    model: config.image.model.clone(),
                    timeout_secs: config.image.timeout_secs,
                },
            )?;
            Ok(Arc::new(generator))
        }
        "stub" => Ok(Arc::new(StubImageGenerator::placeholder())),
        other => bail!("Unknown image provider: {}", other),
    }
}

pub(crate) fn build_publisher(config: &AppConfig) -> Result<Arc<dyn SocialPublisher>> {
    let social = &config.social;

    match social.provider.as_str() {
        "twitter_clone" => {
            let url = non_empty_env(&social.url_env);
            let api_key = non_empty_env(&social.api_key_env);

            // Missing credentials only fail at post time
            let (Some(url), Some(api_key)) = (url, api_key) else {
                tracing::warn!(
                    url_env = %social.url_env,
                    api_key_env = %social.api_key_env,
                    "Twitter clone credentials not set; posting will fail"
                );
                return Ok(Arc::new(UnconfiguredPublisher::new(
                    "Twitter API credentials are not configured",
                )));
            };

            let publisher = TwitterClonePublisher::new(
                url,
                SecretString::new(api_key.into()),
                social.username.clone(),
                social.timeout_secs,
            )?;
            Ok(Arc::new(publisher))
        }
        "stub" => Ok(Arc::new(StubSocialPublisher::accepting())),
        other => bail!("Unknown social provider: {}", other),
    }
}

fn adapter_llm_config(config: &AppConfig) -> AdapterLlmConfig {
    AdapterLlmConfig {
        model: config.llm.model.clone(),
        temperature: config.llm.temperature,
        max_output_tokens: config.llm.max_output_tokens,
        timeout_secs: config.llm.timeout_secs,
        max_tweet_chars: config.llm.max_tweet_chars,
    }
}

fn non_empty_env(env_var: &str) -> Option<String> {
    if env_var.trim().is_empty() {
        return None;
    }
    std::env::var(env_var)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

pub(crate) fn load_api_key(env_var: &str, provider: &str) -> Result<SecretString> {
    if env_var.trim().is_empty() {
        bail!("No API key env var configured for provider {}", provider);
    }

    let key = std::env::var(env_var).with_context(|| {
        format!(
            "Missing API key env var {} for provider {}",
            env_var, provider
        )
    })?;

    if key.trim().is_empty() {
        bail!(
            "API key env var {} is empty for provider {}",
            env_var,
            provider
        );
    }

    Ok(SecretString::new(key.into()))
}
