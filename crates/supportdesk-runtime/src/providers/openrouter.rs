//! OpenRouter Chat Completions transport
//!
//! Sends an OpenAI-compatible chat completions request with bearer
//! authentication and hands back the status and JSON body untouched.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;

use crate::config::CompletionConfig;
use crate::{CompletionTransport, ProviderReply, ProviderRequest, TransportError};

pub const DEFAULT_BASE_URL: &str = "https://openrouter.ai/api/v1";
const COMPLETIONS_PATH: &str = "/chat/completions";

#[derive(Debug, Clone)]
pub struct OpenRouterTransport {
    client: Client,
    endpoint: String,
    referer: String,
    title: String,
}

impl OpenRouterTransport {
    pub fn new(
        base_url: &str,
        referer: impl Into<String>,
        title: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, TransportError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| TransportError::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            endpoint: format!("{}{COMPLETIONS_PATH}", base_url.trim_end_matches('/')),
            referer: referer.into(),
            title: title.into(),
        })
    }

    pub fn from_config(config: &CompletionConfig) -> Result<Self, TransportError> {
        Self::new(
            &config.base_url,
            config.referer.clone(),
            config.title.clone(),
            config.attempt_timeout,
        )
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

fn transport_error(err: &reqwest::Error) -> TransportError {
    if err.is_timeout() {
        TransportError::Timeout
    } else {
        TransportError::Network(err.to_string())
    }
}

#[async_trait]
impl CompletionTransport for OpenRouterTransport {
    fn name(&self) -> &'static str {
        "openrouter"
    }

    async fn send(
        &self,
        api_key: &str,
        request: &ProviderRequest,
    ) -> Result<ProviderReply, TransportError> {
        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(api_key)
            .header("HTTP-Referer", &self.referer)
            .header("X-Title", &self.title)
            .json(request)
            .send()
            .await
            .map_err(|e| transport_error(&e))?;

        let status = response.status().as_u16();
        let text = response.text().await.map_err(|e| transport_error(&e))?;
        let body = serde_json::from_str(&text).unwrap_or(Value::Null);

        Ok(ProviderReply::new(status, body))
    }
}
