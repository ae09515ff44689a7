//! Error taxonomy for reply generation

use std::fmt;

use thiserror::Error;

/// Failure of a single round trip, before any HTTP status was received.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("request timed out")]
    Timeout,
    #[error("network error: {0}")]
    Network(String),
    #[error("mock transport has no queued reply")]
    MockQueueEmpty,
}

/// What went wrong on the provider side once server-side retries ran out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerFault {
    Status(u16),
    Timeout,
}

impl fmt::Display for ServerFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Status(status) => write!(f, "HTTP {status}"),
            Self::Timeout => f.write_str("timed out"),
        }
    }
}

/// Terminal outcome of `generate_reply`.
///
/// Every variant renders exactly one human-readable message suitable for
/// showing to the end user.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CompletionError {
    /// Missing credential or model; no network attempt was made.
    #[error("{0}")]
    Configuration(String),
    #[error("AI returned an empty response.")]
    EmptyReply,
    #[error("The AI is currently busy (Rate Limit). Please wait a few seconds and try again.")]
    RateLimited,
    #[error("The AI service is having trouble ({0}). Please try again in a moment.")]
    Server(ServerFault),
    #[error("Invalid provider API key. Please check your configuration.")]
    Authentication,
    #[error("AI Error: {0}")]
    Provider(String),
    #[error("Failed to generate reply from AI. The service might be temporarily unavailable.")]
    Unavailable,
}

impl CompletionError {
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    /// Stable label for logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Configuration(_) => "configuration",
            Self::EmptyReply => "empty_reply",
            Self::RateLimited => "rate_limited",
            Self::Server(_) => "server",
            Self::Authentication => "authentication",
            Self::Provider(_) => "provider",
            Self::Unavailable => "unavailable",
        }
    }

    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::Configuration(_))
    }
}
