//! LLM provider adapters for writing tweets

pub mod gemini;
pub mod stub;

pub use gemini::GeminiWriter;
pub use stub::StubWriter;

use serde::{Deserialize, Serialize};

/// Common LLM configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Model name/ID
    pub model: String,
    /// Temperature (0.0-1.0)
    pub temperature: f64,
    /// Maximum output tokens
    pub max_output_tokens: u32,
    /// Request timeout in seconds
    pub timeout_secs: u64,
    /// Character budget given to the model for tweet text
    pub max_tweet_chars: usize,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            model: "gemini-2.0-flash".to_string(),
            temperature: 0.7,
            max_output_tokens: 256,
            timeout_secs: 45,
            max_tweet_chars: 280,
        }
    }
}

/// Build the tweet-writing prompt
pub fn build_tweet_prompt(topic: &str, max_chars: usize) -> String {
    format!(
        "Write a short and engaging tweet about {} in under {} characters. \
         Add hashtags if relevant. Reply with the tweet text only.",
        topic, max_chars
    )
}

/// Build the prompt asking whether the topic deserves an image
pub fn build_image_decision_prompt(topic: &str) -> String {
    format!(
        "A tweet is being written about: {}\n\n\
         Would this tweet clearly benefit from an accompanying illustration? \
         Answer with a single word: yes or no.",
        topic
    )
}

/// Parse a yes/no answer, tolerating punctuation and casing
pub fn parse_yes_no(response: &str) -> Result<bool, String> {
    let word = response
        .trim()
        .trim_matches(|c: char| !c.is_alphanumeric())
        .split(|c: char| !c.is_alphanumeric())
        .next()
        .unwrap_or("")
        .to_lowercase();

    match word.as_str() {
        "yes" | "y" | "true" => Ok(true),
        "no" | "n" | "false" => Ok(false),
        _ => Err(format!("Expected yes or no, got: {}", response.trim())),
    }
}

/// Strip wrapping quotes and code fences the model sometimes adds
pub fn clean_tweet_text(response: &str) -> String {
    let mut text = response.trim();

    if let Some(inner) = text.strip_prefix("```") {
        let inner = inner.strip_suffix("```").unwrap_or(inner);
        // Skip a language identifier line if present
        text = match inner.split_once('\n') {
            Some((first, rest)) if !first.contains(' ') => rest,
            _ => inner,
        }
        .trim();
    }

    for (open, close) in [('"', '"'), ('\u{201C}', '\u{201D}')] {
        if text.len() > 1 && text.starts_with(open) && text.ends_with(close) {
            text = text[open.len_utf8()..text.len() - close.len_utf8()].trim();
        }
    }

    text.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_yes_no() {
        assert_eq!(parse_yes_no("Yes"), Ok(true));
        assert_eq!(parse_yes_no("  no.\n"), Ok(false));
        assert_eq!(parse_yes_no("**YES**, definitely"), Ok(true));
        assert!(parse_yes_no("perhaps").is_err());
        assert!(parse_yes_no("").is_err());
    }

    #[test]
    fn test_clean_tweet_text_quotes() {
        assert_eq!(clean_tweet_text("\"Hello world #hi\""), "Hello world #hi");
        assert_eq!(clean_tweet_text("\u{201C}Curly\u{201D}"), "Curly");
        assert_eq!(clean_tweet_text("  plain  "), "plain");
    }

    #[test]
    fn test_clean_tweet_text_code_block() {
        let input = "```text\nShip it! #release\n```";
        assert_eq!(clean_tweet_text(input), "Ship it! #release");
    }

    #[test]
    fn test_tweet_prompt_mentions_topic_and_budget() {
        let prompt = build_tweet_prompt("launch day", 280);
        assert!(prompt.contains("launch day"));
        assert!(prompt.contains("280"));
    }
}
