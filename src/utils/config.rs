// src/utils/config.rs
use std::time::Duration;

use crate::utils::error::AppError;

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_MODEL: &str = "gpt-4-1106-preview";
const DEFAULT_TIMEOUT_SECS: u64 = 120;
const DEFAULT_MAX_RETRIES: u32 = 3;
const DEFAULT_RETRY_BASE_DELAY_MS: u64 = 1000;

/// Settings for the completion client, read once at startup.
///
/// Built from the process environment (after `.env` is loaded) and then
/// adjusted by command-line overrides. Nothing downstream reads the
/// environment on its own.
#[derive(Debug, Clone)]
pub struct ExtractorConfig {
    /// `None` until a key is configured; only checked when a client is built.
    pub api_key: Option<String>,
    pub base_url: String,
    pub model: String,
    pub temperature: f32,
    pub top_p: f32,
    pub max_tokens: u32,
    pub request_timeout: Duration,
    pub max_retries: u32,
    pub retry_base_delay: Duration,
}

impl ExtractorConfig {
    /// Reads the configuration from the process environment.
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from any key lookup (environment, map in tests).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_key = lookup("OPENAI_API_KEY").filter(|key| !key.trim().is_empty());

        let base_url = lookup("OPENAI_BASE_URL")
            .filter(|url| !url.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

        let model = lookup("OPENAI_MODEL")
            .filter(|model| !model.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_MODEL.to_string());

        let timeout_secs = match lookup("OPENAI_TIMEOUT_SECS") {
            Some(raw) => raw.trim().parse::<u64>().map_err(|_| {
                AppError::Config(format!("OPENAI_TIMEOUT_SECS must be a whole number, got '{}'", raw))
            })?,
            None => DEFAULT_TIMEOUT_SECS,
        };

        Ok(Self {
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            model,
            temperature: 0.2,
            top_p: 1.0,
            max_tokens: 4095,
            request_timeout: Duration::from_secs(timeout_secs),
            max_retries: DEFAULT_MAX_RETRIES,
            retry_base_delay: Duration::from_millis(DEFAULT_RETRY_BASE_DELAY_MS),
        })
    }

    pub fn chat_completions_url(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_applied() {
        let config = ExtractorConfig::from_lookup(lookup_from(&[("OPENAI_API_KEY", "sk-test")]))
            .expect("config should build");

        assert_eq!(config.api_key.as_deref(), Some("sk-test"));
        assert_eq!(config.model, DEFAULT_MODEL);
        assert_eq!(config.chat_completions_url(), "https://api.openai.com/v1/chat/completions");
        assert_eq!(config.max_tokens, 4095);
        assert_eq!(config.request_timeout, Duration::from_secs(120));
    }

    #[test]
    fn test_missing_api_key_is_left_unset() {
        let config = ExtractorConfig::from_lookup(lookup_from(&[("OPENAI_MODEL", "gpt-4o")]))
            .expect("a missing key is not a configuration error by itself");
        assert_eq!(config.api_key, None);

        let blank = ExtractorConfig::from_lookup(lookup_from(&[("OPENAI_API_KEY", "  ")])).unwrap();
        assert_eq!(blank.api_key, None);
    }

    #[test]
    fn test_overrides_from_environment() {
        let config = ExtractorConfig::from_lookup(lookup_from(&[
            ("OPENAI_API_KEY", "sk-test"),
            ("OPENAI_BASE_URL", "http://localhost:8080/v1/"),
            ("OPENAI_MODEL", "gpt-4o-mini"),
            ("OPENAI_TIMEOUT_SECS", "30"),
        ]))
        .expect("config should build");

        assert_eq!(config.chat_completions_url(), "http://localhost:8080/v1/chat/completions");
        assert_eq!(config.model, "gpt-4o-mini");
        assert_eq!(config.request_timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_bad_timeout_rejected() {
        let result = ExtractorConfig::from_lookup(lookup_from(&[
            ("OPENAI_API_KEY", "sk-test"),
            ("OPENAI_TIMEOUT_SECS", "soon"),
        ]));
        assert!(matches!(result, Err(AppError::Config(_))));
    }
}
