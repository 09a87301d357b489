//! Configuration loading and management

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Top-level configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub general: GeneralConfig,

    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub llm: LlmConfig,

    #[serde(default)]
    pub image: ImageConfig,

    #[serde(default)]
    pub social: SocialConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    #[serde(default = "default_database_path")]
    pub database_path: PathBuf,

    #[serde(default = "default_images_dir")]
    pub images_dir: PathBuf,

    #[serde(default = "default_log_level")]
    pub log_level: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,

    /// "*" or an empty list allows any origin
    #[serde(default = "default_cors_origins")]
    pub cors_origins: Vec<String>,

    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    #[serde(default = "default_max_page_limit")]
    pub max_page_limit: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    #[serde(default = "default_llm_provider")]
    pub provider: String,

    #[serde(default = "default_llm_model")]
    pub model: String,

    #[serde(default = "default_temperature")]
    pub temperature: f64,

    #[serde(default = "default_max_output_tokens")]
    pub max_output_tokens: u32,

    #[serde(default = "default_llm_timeout")]
    pub timeout_secs: u64,

    #[serde(default = "default_max_tweet_chars")]
    pub max_tweet_chars: usize,

    #[serde(default)]
    pub gemini: GeminiConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeminiConfig {
    #[serde(default = "default_gemini_api_key_env")]
    pub api_key_env: String,

    #[serde(default = "default_gemini_base_url")]
    pub base_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageConfig {
    #[serde(default = "default_image_provider")]
    pub provider: String,

    #[serde(default = "default_image_model")]
    pub model: String,

    #[serde(default = "default_image_timeout")]
    pub timeout_secs: u64,

    #[serde(default)]
    pub huggingface: HuggingFaceConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HuggingFaceConfig {
    #[serde(default = "default_huggingface_token_env")]
    pub token_env: String,

    #[serde(default = "default_huggingface_base_url")]
    pub base_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SocialConfig {
    #[serde(default = "default_social_provider")]
    pub provider: String,

    #[serde(default = "default_social_url_env")]
    pub url_env: String,

    #[serde(default = "default_social_api_key_env")]
    pub api_key_env: String,

    #[serde(default = "default_social_username")]
    pub username: String,

    #[serde(default = "default_social_timeout")]
    pub timeout_secs: u64,
}

// Default value functions
fn default_database_path() -> PathBuf {
    PathBuf::from("./tweets.sqlite")
}

fn default_images_dir() -> PathBuf {
    PathBuf::from("./images")
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_bind() -> String {
    "127.0.0.1:8000".to_string()
}

fn default_cors_origins() -> Vec<String> {
    vec!["http://localhost:5173".to_string()]
}

fn default_request_timeout() -> u64 {
    300
}

/// Headroom over collaborator timeouts for storage and image file writes
const REQUEST_TIMEOUT_SLACK_SECS: u64 = 30;

fn default_max_page_limit() -> u64 {
    tweetbot_domain::policy::MAX_PAGE_LIMIT
}

fn default_llm_provider() -> String {
    "gemini".to_string()
}

fn default_llm_model() -> String {
    "gemini-2.0-flash".to_string()
}

fn default_temperature() -> f64 {
    0.7
}

fn default_max_output_tokens() -> u32 {
    256
}

fn default_llm_timeout() -> u64 {
    45
}

fn default_max_tweet_chars() -> usize {
    280
}

fn default_gemini_api_key_env() -> String {
    "GEMINI_API_KEY".to_string()
}

fn default_gemini_base_url() -> String {
    "https://generativelanguage.googleapis.com".to_string()
}

fn default_image_provider() -> String {
    "huggingface".to_string()
}

fn default_image_model() -> String {
    "stabilityai/stable-diffusion-xl-base-1.0".to_string()
}

fn default_image_timeout() -> u64 {
    120
}

fn default_huggingface_token_env() -> String {
    "HUGGINGFACE_TOKEN".to_string()
}

fn default_huggingface_base_url() -> String {
    "https://api-inference.huggingface.co".to_string()
}

fn default_social_provider() -> String {
    "twitter_clone".to_string()
}

fn default_social_url_env() -> String {
    "TWITTER_CLONE_URL".to_string()
}

fn default_social_api_key_env() -> String {
    "TWITTER_CLONE_API_KEY".to_string()
}

fn default_social_username() -> String {
    "tweetbot".to_string()
}

fn default_social_timeout() -> u64 {
    30
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            images_dir: default_images_dir(),
            log_level: default_log_level(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            cors_origins: default_cors_origins(),
            request_timeout_secs: default_request_timeout(),
            max_page_limit: default_max_page_limit(),
        }
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: default_llm_provider(),
            model: default_llm_model(),
            temperature: default_temperature(),
            max_output_tokens: default_max_output_tokens(),
            timeout_secs: default_llm_timeout(),
            max_tweet_chars: default_max_tweet_chars(),
            gemini: GeminiConfig::default(),
        }
    }
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_key_env: default_gemini_api_key_env(),
            base_url: default_gemini_base_url(),
        }
    }
}

impl Default for ImageConfig {
    fn default() -> Self {
        Self {
            provider: default_image_provider(),
            model: default_image_model(),
            timeout_secs: default_image_timeout(),
            huggingface: HuggingFaceConfig::default(),
        }
    }
}

impl Default for HuggingFaceConfig {
    fn default() -> Self {
        Self {
            token_env: default_huggingface_token_env(),
            base_url: default_huggingface_base_url(),
        }
    }
}

impl Default for SocialConfig {
    fn default() -> Self {
        Self {
            provider: default_social_provider(),
            url_env: default_social_url_env(),
            api_key_env: default_social_api_key_env(),
            username: default_social_username(),
            timeout_secs: default_social_timeout(),
        }
    }
}

impl ServerConfig {
    /// Whether CORS should allow any origin
    pub fn cors_is_permissive(&self) -> bool {
        self.cors_origins.is_empty() || self.cors_origins.iter().any(|o| o.trim() == "*")
    }
}

impl AppConfig {
    /// Slowest handler path: tweet text, image decision, then the image
    pub fn min_request_timeout_secs(&self) -> u64 {
        let generate = self
            .llm
            .timeout_secs
            .saturating_mul(2)
            .saturating_add(self.image.timeout_secs);
        generate
            .max(self.social.timeout_secs)
            .saturating_add(REQUEST_TIMEOUT_SLACK_SECS)
    }

    /// Request timeout raised to cover the collaborator timeouts, so a
    /// handler is never cancelled between saving an image and recording it
    pub fn effective_request_timeout_secs(&self) -> u64 {
        self.server
            .request_timeout_secs
            .max(self.min_request_timeout_secs())
    }

    /// Load configuration from file and environment
    pub fn load(config_path: Option<&Path>) -> Result<Self> {
        let mut builder = config::Config::builder();

        // Try default config path if none specified
        let default_path = PathBuf::from("./config.toml");
        let path = config_path.unwrap_or(&default_path);

        if path.exists() {
            builder = builder.add_source(config::File::from(path));
        } else if config_path.is_some() {
            // User specified a path that doesn't exist
            anyhow::bail!("Config file not found: {}", path.display());
        }

        // Add environment variable overrides
        builder = builder.add_source(
            config::Environment::with_prefix("TWEETBOT")
                .separator("__")
                .list_separator(",")
                .with_list_parse_key("server.cors_origins")
                .try_parsing(true),
        );

        let config = builder.build().context("Failed to build configuration")?;

        config
            .try_deserialize()
            .context("Failed to deserialize configuration")
    }

    /// Generate example configuration as TOML string
    pub fn example_toml() -> String {
        r#"# tweetbot configuration

[general]
database_path = "./tweets.sqlite"
images_dir = "./images"
log_level = "info"

[server]
bind = "127.0.0.1:8000"
# "*" or an empty list allows any origin
cors_origins = ["http://localhost:5173"]
request_timeout_secs = 300
max_page_limit = 100

[llm]
provider = "gemini"  # gemini, stub
model = "gemini-2.0-flash"
temperature = 0.7
max_output_tokens = 256
timeout_secs = 45
max_tweet_chars = 280

[llm.gemini]
api_key_env = "GEMINI_API_KEY"
base_url = "https://generativelanguage.googleapis.com"

[image]
provider = "huggingface"  # huggingface, stub
model = "stabilityai/stable-diffusion-xl-base-1.0"
timeout_secs = 120

[image.huggingface]
token_env = "HUGGINGFACE_TOKEN"
base_url = "https://api-inference.huggingface.co"

[social]
provider = "twitter_clone"  # twitter_clone, stub
url_env = "TWITTER_CLONE_URL"
api_key_env = "TWITTER_CLONE_API_KEY"
username = "tweetbot"
timeout_secs = 30
"#
        .to_string()
    }
}
