//! Runtime for generating support replies through a hosted completion provider.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use supportdesk_context::Role;
use tokio::time::Instant;

pub mod client;
pub mod config;
pub mod error;
pub mod prompt;
pub mod providers;
pub mod retry;

pub use client::{CompletionClient, ReplyGenerator};
pub use config::CompletionConfig;
pub use error::{CompletionError, ServerFault, TransportError};
pub use providers::OpenRouterTransport;
pub use retry::{
    classify, AttemptDecision, ProviderOutcome, RetryConfig, RetryPolicy, RetryReason,
    RetryableFailure,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    System,
    User,
    Assistant,
}

impl From<Role> for ChatRole {
    fn from(role: Role) -> Self {
        match role {
            Role::User => Self::User,
            Role::Assistant => Self::Assistant,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn new(role: ChatRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }
}

/// Chat completion payload sent to the provider.
///
/// Built once per reply and shared by reference across attempts; there are no
/// mutating accessors.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProviderRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f32,
}

impl ProviderRequest {
    pub fn new(model: impl Into<String>, messages: Vec<ChatMessage>, temperature: f32) -> Self {
        Self {
            model: model.into(),
            messages,
            temperature,
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn temperature(&self) -> f32 {
        self.temperature
    }
}

/// Raw provider answer: HTTP status plus the JSON body (`null` when the body
/// was not JSON).
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderReply {
    pub status: u16,
    pub body: Value,
}

impl ProviderReply {
    pub fn new(status: u16, body: Value) -> Self {
        Self { status, body }
    }

    /// A 200 reply in chat-completions shape carrying `content`.
    pub fn completion(content: impl Into<String>) -> Self {
        Self::new(
            200,
            serde_json::json!({
                "choices": [
                    { "index": 0, "message": { "role": "assistant", "content": content.into() } }
                ]
            }),
        )
    }

    /// A reply with the given status and no body.
    pub fn status_only(status: u16) -> Self {
        Self::new(status, Value::Null)
    }

    /// A reply carrying a provider error message.
    pub fn error(status: u16, message: impl Into<String>) -> Self {
        Self::new(
            status,
            serde_json::json!({ "error": { "code": status, "message": message.into() } }),
        )
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// `choices[0].message.content`, if present and non-empty.
    pub fn content(&self) -> Option<&str> {
        self.body
            .pointer("/choices/0/message/content")
            .and_then(Value::as_str)
            .filter(|content| !content.is_empty())
    }

    /// `error.message`, if present and non-empty.
    pub fn error_message(&self) -> Option<&str> {
        self.body
            .pointer("/error/message")
            .and_then(Value::as_str)
            .filter(|message| !message.is_empty())
    }
}

/// One network round trip to a completion provider.
///
/// Implementations only move bytes; classification and retries are handled by
/// [`CompletionClient`].
#[async_trait]
pub trait CompletionTransport: Send + Sync {
    fn name(&self) -> &'static str;

    async fn send(
        &self,
        api_key: &str,
        request: &ProviderRequest,
    ) -> Result<ProviderReply, TransportError>;
}

type MockStep = (Option<Duration>, Result<ProviderReply, TransportError>);

/// Scripted transport that replays queued replies in order.
#[derive(Debug, Default)]
pub struct MockTransport {
    queue: Mutex<VecDeque<MockStep>>,
    requests: Mutex<Vec<(Instant, ProviderRequest)>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn enqueue(&self, result: Result<ProviderReply, TransportError>) {
        self.queue
            .lock()
            .expect("mock transport queue poisoned")
            .push_back((None, result));
    }

    /// Queue a result that is only produced after `delay` has elapsed.
    pub fn enqueue_delayed(&self, delay: Duration, result: Result<ProviderReply, TransportError>) {
        self.queue
            .lock()
            .expect("mock transport queue poisoned")
            .push_back((Some(delay), result));
    }

    /// Number of `send` calls observed so far.
    pub fn calls(&self) -> usize {
        self.requests
            .lock()
            .expect("mock transport requests poisoned")
            .len()
    }

    /// Requests observed so far, in call order.
    pub fn requests(&self) -> Vec<ProviderRequest> {
        self.requests
            .lock()
            .expect("mock transport requests poisoned")
            .iter()
            .map(|(_, request)| request.clone())
            .collect()
    }

    /// Instants at which each `send` call started.
    pub fn call_times(&self) -> Vec<Instant> {
        self.requests
            .lock()
            .expect("mock transport requests poisoned")
            .iter()
            .map(|(at, _)| *at)
            .collect()
    }
}

#[async_trait]
impl CompletionTransport for MockTransport {
    fn name(&self) -> &'static str {
        "mock"
    }

    async fn send(
        &self,
        _api_key: &str,
        request: &ProviderRequest,
    ) -> Result<ProviderReply, TransportError> {
        self.requests
            .lock()
            .expect("mock transport requests poisoned")
            .push((Instant::now(), request.clone()));

        let next = self
            .queue
            .lock()
            .expect("mock transport queue poisoned")
            .pop_front();

        let (delay, result) = next.unwrap_or((None, Err(TransportError::MockQueueEmpty)));
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        result
    }
}
