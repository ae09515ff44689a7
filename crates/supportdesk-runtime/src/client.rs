//! Reply generation over a completion transport

use std::sync::Arc;

use async_trait::async_trait;
use supportdesk_context::{ConversationContext, Turn};
use tokio::time::{sleep, timeout};
use tracing::{debug, info, warn};

use crate::config::CompletionConfig;
use crate::error::{CompletionError, TransportError};
use crate::providers::OpenRouterTransport;
use crate::retry::{classify, AttemptDecision, RetryConfig, RetryPolicy};
use crate::{ChatMessage, ChatRole, CompletionTransport, ProviderRequest};

/// Anything that can turn a conversation into the next assistant reply.
#[async_trait]
pub trait ReplyGenerator: Send + Sync {
    async fn generate_reply(
        &self,
        history: &[Turn],
        user_message: &str,
    ) -> Result<String, CompletionError>;
}

/// Completion client: windows history, builds the provider request and runs
/// the retry loop.
pub struct CompletionClient {
    config: CompletionConfig,
    transport: Arc<dyn CompletionTransport>,
}

impl CompletionClient {
    pub fn new(config: CompletionConfig, transport: Arc<dyn CompletionTransport>) -> Self {
        Self { config, transport }
    }

    /// Client backed by the OpenRouter HTTP transport.
    pub fn from_config(config: CompletionConfig) -> Result<Self, TransportError> {
        let transport = OpenRouterTransport::from_config(&config)?;
        Ok(Self::new(config, Arc::new(transport)))
    }

    pub fn config(&self) -> &CompletionConfig {
        &self.config
    }

    /// System turn, windowed history, then the new user turn.
    pub fn build_request(
        &self,
        model: &str,
        history: &[Turn],
        user_message: &str,
    ) -> ProviderRequest {
        let context = ConversationContext::new(history, user_message);
        let messages = std::iter::once(ChatMessage::new(
            ChatRole::System,
            self.config.system_prompt.as_str(),
        ))
        .chain(
            context
                .windowed(self.config.window)
                .map(|turn| ChatMessage::new(turn.role().into(), turn.content())),
        )
        .collect();

        ProviderRequest::new(model, messages, self.config.temperature)
    }

    /// Generate a reply allowing `max_retries` extra attempts for retryable
    /// failures.
    pub async fn generate_reply_with_retries(
        &self,
        history: &[Turn],
        user_message: &str,
        max_retries: u32,
    ) -> Result<String, CompletionError> {
        let (api_key, model) = self.config.credentials()?;
        let request = self.build_request(model, history, user_message);
        let policy = RetryPolicy::new(RetryConfig {
            max_retries,
            ..self.config.retry.clone()
        });
        let provider = self.transport.name();

        for attempt in 0..=max_retries {
            let result = timeout(
                self.config.attempt_timeout,
                self.transport.send(api_key, &request),
            )
            .await
            .unwrap_or(Err(TransportError::Timeout));

            match &result {
                Ok(reply) => debug!(provider, attempt, status = reply.status, "provider responded"),
                Err(e) => warn!(provider, attempt, error = %e, "provider request failed"),
            }

            match policy.decide(classify(result), attempt) {
                AttemptDecision::Success(content) => {
                    info!(provider, attempts = attempt + 1, "reply generated");
                    return Ok(content);
                }
                AttemptDecision::Retry(delay) => {
                    warn!(
                        provider,
                        attempt,
                        delay_ms = delay.as_millis(),
                        "retryable provider failure, backing off"
                    );
                    sleep(delay).await;
                }
                AttemptDecision::Fail(error) => {
                    warn!(
                        provider,
                        attempt,
                        kind = error.kind(),
                        error = %error,
                        "reply generation failed"
                    );
                    return Err(error);
                }
            }
        }

        Err(CompletionError::Unavailable)
    }
}

#[async_trait]
impl ReplyGenerator for CompletionClient {
    async fn generate_reply(
        &self,
        history: &[Turn],
        user_message: &str,
    ) -> Result<String, CompletionError> {
        self.generate_reply_with_retries(history, user_message, self.config.retry.max_retries)
            .await
    }
}
