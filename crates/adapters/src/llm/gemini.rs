//! Google Gemini API adapter

use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tweetbot_domain::{GenerationError, TweetWriter};

use super::{
    LlmConfig, build_image_decision_prompt, build_tweet_prompt, clean_tweet_text, parse_yes_no,
};

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// Gemini-backed tweet writer
pub struct GeminiWriter {
    client: Client,
    api_key: SecretString,
    base_url: String,
    config: LlmConfig,
}

impl GeminiWriter {
    pub fn new(api_key: SecretString, config: LlmConfig) -> Result<Self, GenerationError> {
        Self::with_base_url(api_key, DEFAULT_BASE_URL.to_string(), config)
    }

    pub fn with_base_url(
        api_key: SecretString,
        base_url: String,
        config: LlmConfig,
    ) -> Result<Self, GenerationError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| GenerationError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            config,
        })
    }

    async fn call_api(&self, prompt: &str, system: &str) -> Result<String, GenerationError> {
        let request = GeminiRequest {
            contents: vec![Content {
                parts: vec![Part {
                    text: prompt.to_string(),
                }],
            }],
            generation_config: Some(GenerationConfig {
                temperature: Some(self.config.temperature),
                max_output_tokens: Some(self.config.max_output_tokens),
            }),
            system_instruction: Some(SystemInstruction {
                parts: vec![Part {
                    text: system.to_string(),
                }],
            }),
        };

        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, self.config.model
        );

        let response = self
            .client
            .post(&url)
            .query(&[("key", self.api_key.expose_secret())])
            .header("Content-Type", "application/json")
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

        if response.status() == 429 {
            return Err(GenerationError::RateLimited);
        }

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(GenerationError::Api(format!(
                "API returned {}: {}",
                status, body
            )));
        }

        let api_response: GeminiResponse = response
            .json()
            .await
            .map_err(|e| GenerationError::InvalidFormat(e.to_string()))?;

        let text = api_response
            .candidates
            .into_iter()
            .flat_map(|c| c.content.parts)
            .map(|p| p.text)
            .collect::<Vec<_>>()
            .join("");

        if text.trim().is_empty() {
            return Err(GenerationError::InvalidFormat("Empty response".to_string()));
        }

        Ok(text)
    }
}

#[derive(Serialize)]
struct GeminiRequest {
    contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none", rename = "generationConfig")]
    generation_config: Option<GenerationConfig>,
    #[serde(skip_serializing_if = "Option::is_none", rename = "systemInstruction")]
    system_instruction: Option<SystemInstruction>,
}

#[derive(Serialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Serialize, Deserialize)]
struct Part {
    text: String,
}

#[derive(Serialize)]
struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none", rename = "maxOutputTokens")]
    max_output_tokens: Option<u32>,
}

#[derive(Serialize)]
struct SystemInstruction {
    parts: Vec<Part>,
}

#[derive(Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: ResponseContent,
}

#[derive(Deserialize)]
struct ResponseContent {
    #[serde(default)]
    parts: Vec<Part>,
}

#[async_trait]
impl TweetWriter for GeminiWriter {
    async fn write_tweet(&self, topic: &str) -> Result<String, GenerationError> {
        let prompt = build_tweet_prompt(topic, self.config.max_tweet_chars);
        let text = self
            .call_api(&prompt, "You write concise, engaging social media posts.")
            .await?;

        Ok(clean_tweet_text(&text))
    }

    async fn needs_image(&self, topic: &str) -> Result<bool, GenerationError> {
        let prompt = build_image_decision_prompt(topic);
        let answer = self
            .call_api(&prompt, "Answer strictly with yes or no.")
            .await?;

        parse_yes_no(&answer).map_err(GenerationError::InvalidFormat)
    }
}
