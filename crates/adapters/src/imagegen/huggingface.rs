//! Hugging Face inference API adapter for text-to-image models

use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tweetbot_domain::{GenerationError, ImageGenerator};

use super::build_image_prompt;

pub const DEFAULT_BASE_URL: &str = "https://api-inference.huggingface.co";

/// Hugging Face image generation settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HuggingFaceConfig {
    /// Model repository id
    pub model: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for HuggingFaceConfig {
    fn default() -> Self {
        Self {
            model: "stabilityai/stable-diffusion-xl-base-1.0".to_string(),
            timeout_secs: 120,
        }
    }
}

/// Image generator calling a hosted text-to-image model
pub struct HuggingFaceImageGenerator {
    client: Client,
    token: SecretString,
    base_url: String,
    config: HuggingFaceConfig,
}

impl HuggingFaceImageGenerator {
    pub fn new(token: SecretString, config: HuggingFaceConfig) -> Result<Self, GenerationError> {
        Self::with_base_url(token, DEFAULT_BASE_URL.to_string(), config)
    }

    pub fn with_base_url(
        token: SecretString,
        base_url: String,
        config: HuggingFaceConfig,
    ) -> Result<Self, GenerationError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| GenerationError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            token,
            base_url: base_url.trim_end_matches('/').to_string(),
            config,
        })
    }
}

#[derive(Serialize)]
struct InferenceRequest {
    inputs: String,
}

#[async_trait]
impl ImageGenerator for HuggingFaceImageGenerator {
    async fn generate_image(&self, topic: &str) -> Result<Vec<u8>, GenerationError> {
        let url = format!("{}/models/{}", self.base_url, self.config.model);
        let request = InferenceRequest {
            inputs: build_image_prompt(topic),
        };

        tracing::debug!(model = %self.config.model, "Requesting image");

        let response = self
            .client
            .post(&url)
            .header(
                "Authorization",
                format!("Bearer {}", self.token.expose_secret()),
            )
            .header("Accept", "image/png")
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    GenerationError::Timeout
                } else {
                    GenerationError::Api(e.to_string())
                }
            })?;

        let status = response.status();

        if status == 429 {
            return Err(GenerationError::RateLimited);
        }

        if status == 401 || status == 403 {
            return Err(GenerationError::Config(
                "Hugging Face token rejected".to_string(),
            ));
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GenerationError::Api(format!(
                "API returned {}: {}",
                status, body
            )));
        }

        let is_json = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|ct| ct.starts_with("application/json"));

        let bytes = response
            .bytes()
            .await
            .map_err(|e| GenerationError::Api(e.to_string()))?;

        if is_json {
            return Err(GenerationError::InvalidFormat(format!(
                "Expected image bytes, got JSON: {}",
                String::from_utf8_lossy(&bytes)
            )));
        }

        Ok(bytes.to_vec())
    }
}
