//! Completion client configuration
//!
//! The client never reads the process environment on its own: a
//! [`CompletionConfig`] value is handed over at construction.
//! [`CompletionConfig::from_env`] exists for binaries.

use std::time::Duration;

use supportdesk_context::ContextWindow;

use crate::error::CompletionError;
use crate::prompt::SYSTEM_PROMPT;
use crate::providers::openrouter::DEFAULT_BASE_URL;
use crate::retry::RetryConfig;

pub const API_KEY_ENV: &str = "OPENROUTER_API_KEY";
pub const MODEL_ENV: &str = "LLM_MODEL";
pub const BASE_URL_ENV: &str = "OPENROUTER_API_BASE";

pub const DEFAULT_TEMPERATURE: f32 = 0.7;
pub const DEFAULT_ATTEMPT_TIMEOUT: Duration = Duration::from_secs(15);
const DEFAULT_REFERER: &str = "https://tech-task.example.com";
const DEFAULT_TITLE: &str = "Tech AI Chat Agent";

#[derive(Debug, Clone)]
pub struct CompletionConfig {
    pub api_key: Option<String>,
    pub model: Option<String>,
    pub base_url: String,
    pub temperature: f32,
    /// Upper bound for a single provider round trip.
    pub attempt_timeout: Duration,
    pub retry: RetryConfig,
    pub window: ContextWindow,
    pub system_prompt: String,
    /// Sent as `HTTP-Referer` for provider-side attribution.
    pub referer: String,
    /// Sent as `X-Title`.
    pub title: String,
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            temperature: DEFAULT_TEMPERATURE,
            attempt_timeout: DEFAULT_ATTEMPT_TIMEOUT,
            retry: RetryConfig::default(),
            window: ContextWindow::default(),
            system_prompt: SYSTEM_PROMPT.to_string(),
            referer: DEFAULT_REFERER.to_string(),
            title: DEFAULT_TITLE.to_string(),
        }
    }
}

impl CompletionConfig {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            api_key: Some(api_key.into()),
            model: Some(model.into()),
            ..Self::default()
        }
    }

    /// Load from the process environment, reading a `.env` file first if one
    /// exists.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup. Blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let non_blank = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        let defaults = Self::default();

        Self {
            api_key: non_blank(API_KEY_ENV),
            model: non_blank(MODEL_ENV),
            base_url: non_blank(BASE_URL_ENV).unwrap_or(defaults.base_url),
            ..defaults
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_attempt_timeout(mut self, timeout: Duration) -> Self {
        self.attempt_timeout = timeout;
        self
    }

    /// Credential and model, or a configuration error naming what is missing.
    pub fn credentials(&self) -> Result<(&str, &str), CompletionError> {
        let api_key = self
            .api_key
            .as_deref()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| {
                CompletionError::configuration(format!("{API_KEY_ENV} is not set."))
            })?;
        let model = self
            .model
            .as_deref()
            .filter(|model| !model.trim().is_empty())
            .ok_or_else(|| CompletionError::configuration(format!("{MODEL_ENV} is not set.")))?;
        Ok((api_key, model))
    }

    pub fn validate(&self) -> Result<(), CompletionError> {
        self.credentials().map(|_| ())
    }
}
