//! Failure classification and retry policy for provider calls
//!
//! One attempt flows through two pure steps: [`classify`] turns the raw
//! transport result into a [`ProviderOutcome`], then [`RetryPolicy::decide`]
//! turns that outcome into an [`AttemptDecision`] the client acts on.

use std::time::Duration;

use crate::error::{CompletionError, ServerFault, TransportError};
use crate::ProviderReply;

#[derive(Debug, Clone, PartialEq)]
pub struct RetryConfig {
    /// Extra attempts after the first one.
    pub max_retries: u32,
    pub initial_delay_ms: u64,
    /// Optional ceiling on a single backoff. Unbounded by default.
    pub max_delay_ms: Option<u64>,
    pub multiplier: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 2,
            initial_delay_ms: 1_000,
            max_delay_ms: None,
            multiplier: 2.0,
        }
    }
}

/// Why an attempt may be worth repeating.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryReason {
    RateLimited,
    Server(u16),
    Timeout,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryableFailure {
    pub reason: RetryReason,
    /// Provider-supplied `error.message`, surfaced if retries run out.
    pub provider_message: Option<String>,
}

impl RetryableFailure {
    pub fn new(reason: RetryReason) -> Self {
        Self {
            reason,
            provider_message: None,
        }
    }

    /// The error reported once no attempts remain.
    pub fn into_terminal(self) -> CompletionError {
        if let Some(message) = self.provider_message {
            return CompletionError::Provider(message);
        }
        match self.reason {
            RetryReason::RateLimited => CompletionError::RateLimited,
            RetryReason::Server(status) => CompletionError::Server(ServerFault::Status(status)),
            RetryReason::Timeout => CompletionError::Server(ServerFault::Timeout),
        }
    }
}

/// Classified result of one provider attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderOutcome {
    Success(String),
    Retryable(RetryableFailure),
    Terminal(CompletionError),
}

/// What the client does next.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttemptDecision {
    Success(String),
    Retry(Duration),
    Fail(CompletionError),
}

/// Classify the result of a single attempt.
pub fn classify(result: Result<ProviderReply, TransportError>) -> ProviderOutcome {
    let reply = match result {
        Ok(reply) => reply,
        Err(TransportError::Timeout) => {
            return ProviderOutcome::Retryable(RetryableFailure::new(RetryReason::Timeout));
        }
        Err(_) => return ProviderOutcome::Terminal(CompletionError::Unavailable),
    };

    if reply.is_success() {
        if let Some(content) = reply.content() {
            return ProviderOutcome::Success(content.to_string());
        }
        if let Some(message) = reply.error_message() {
            return ProviderOutcome::Terminal(CompletionError::Provider(message.to_string()));
        }
        return ProviderOutcome::Terminal(CompletionError::EmptyReply);
    }

    let reason = match reply.status {
        429 => Some(RetryReason::RateLimited),
        status if status >= 500 => Some(RetryReason::Server(status)),
        _ => None,
    };
    if let Some(reason) = reason {
        return ProviderOutcome::Retryable(RetryableFailure {
            reason,
            provider_message: reply.error_message().map(str::to_string),
        });
    }

    if let Some(message) = reply.error_message() {
        return ProviderOutcome::Terminal(CompletionError::Provider(message.to_string()));
    }

    match reply.status {
        401 => ProviderOutcome::Terminal(CompletionError::Authentication),
        _ => ProviderOutcome::Terminal(CompletionError::Unavailable),
    }
}

#[derive(Debug, Clone)]
pub struct RetryPolicy {
    config: RetryConfig,
}

impl RetryPolicy {
    pub fn new(config: RetryConfig) -> Self {
        Self { config }
    }

    /// Backoff before the attempt following `attempt`: `initial · multiplier^attempt`,
    /// capped at `max_delay_ms` when one is set.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let exponent = i32::try_from(attempt).unwrap_or(i32::MAX);
        let delay_ms = (self.config.initial_delay_ms as f64) * self.config.multiplier.powi(exponent);
        let capped = match self.config.max_delay_ms {
            Some(max) => delay_ms.min(max as f64),
            None => delay_ms,
        };
        Duration::from_millis(capped as u64)
    }

    /// Decide what follows the outcome of attempt number `attempt` (0-based).
    pub fn decide(&self, outcome: ProviderOutcome, attempt: u32) -> AttemptDecision {
        match outcome {
            ProviderOutcome::Success(content) => AttemptDecision::Success(content),
            ProviderOutcome::Terminal(error) => AttemptDecision::Fail(error),
            ProviderOutcome::Retryable(failure) => {
                if attempt < self.config.max_retries {
                    AttemptDecision::Retry(self.delay_for(attempt))
                } else {
                    AttemptDecision::Fail(failure.into_terminal())
                }
            }
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(RetryConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn retryable(reason: RetryReason) -> ProviderOutcome {
        ProviderOutcome::Retryable(RetryableFailure::new(reason))
    }

    #[test]
    fn delays_double_from_one_second() {
        let policy = RetryPolicy::default();

        assert_eq!(policy.delay_for(0), Duration::from_secs(1));
        assert_eq!(policy.delay_for(1), Duration::from_secs(2));
        assert_eq!(policy.delay_for(2), Duration::from_secs(4));
    }

    #[test]
    fn default_delays_keep_doubling_without_a_ceiling() {
        let policy = RetryPolicy::new(RetryConfig {
            max_retries: 6,
            ..RetryConfig::default()
        });

        let delays: Vec<Duration> = (0..6)
            .map(|attempt| {
                match policy.decide(retryable(RetryReason::Server(500)), attempt) {
                    AttemptDecision::Retry(delay) => delay,
                    other => panic!("unexpected decision: {other:?}"),
                }
            })
            .collect();

        assert_eq!(
            delays,
            [1, 2, 4, 8, 16, 32].map(Duration::from_secs).to_vec()
        );
        assert_eq!(policy.delay_for(5), Duration::from_secs(32));
    }

    #[test]
    fn delay_respects_max_delay() {
        let policy = RetryPolicy::new(RetryConfig {
            max_retries: 10,
            initial_delay_ms: 1_000,
            max_delay_ms: Some(5_000),
            multiplier: 2.0,
        });

        assert_eq!(policy.delay_for(2), Duration::from_secs(4));
        assert_eq!(policy.delay_for(3), Duration::from_secs(5));
        assert_eq!(policy.delay_for(9), Duration::from_secs(5));
    }

    #[test]
    fn success_with_content() {
        assert_eq!(
            classify(Ok(ProviderReply::completion("hi"))),
            ProviderOutcome::Success("hi".to_string())
        );
    }

    #[test]
    fn success_without_content_is_terminal_empty_reply() {
        assert_eq!(
            classify(Ok(ProviderReply::completion(""))),
            ProviderOutcome::Terminal(CompletionError::EmptyReply)
        );
        assert_eq!(
            classify(Ok(ProviderReply::status_only(200))),
            ProviderOutcome::Terminal(CompletionError::EmptyReply)
        );
    }

    #[test]
    fn success_status_with_error_body_surfaces_provider_message() {
        assert_eq!(
            classify(Ok(ProviderReply::error(200, "upstream refused"))),
            ProviderOutcome::Terminal(CompletionError::Provider("upstream refused".to_string()))
        );
    }

    #[test]
    fn rate_limit_and_server_errors_are_retryable() {
        assert_eq!(
            classify(Ok(ProviderReply::status_only(429))),
            retryable(RetryReason::RateLimited)
        );
        assert_eq!(
            classify(Ok(ProviderReply::status_only(502))),
            retryable(RetryReason::Server(502))
        );
        assert_eq!(
            classify(Err(TransportError::Timeout)),
            retryable(RetryReason::Timeout)
        );
    }

    #[test]
    fn retryable_failure_keeps_provider_message() {
        assert_eq!(
            classify(Ok(ProviderReply::error(503, "overloaded"))),
            ProviderOutcome::Retryable(RetryableFailure {
                reason: RetryReason::Server(503),
                provider_message: Some("overloaded".to_string()),
            })
        );
    }

    #[test]
    fn unauthorized_is_terminal() {
        assert_eq!(
            classify(Ok(ProviderReply::status_only(401))),
            ProviderOutcome::Terminal(CompletionError::Authentication)
        );
    }

    #[test]
    fn provider_message_wins_over_status_mapping() {
        assert_eq!(
            classify(Ok(ProviderReply::error(401, "No auth credentials found"))),
            ProviderOutcome::Terminal(CompletionError::Provider(
                "No auth credentials found".to_string()
            ))
        );
    }

    #[test]
    fn network_and_unexpected_status_are_unavailable() {
        assert_eq!(
            classify(Err(TransportError::Network("connection refused".to_string()))),
            ProviderOutcome::Terminal(CompletionError::Unavailable)
        );
        assert_eq!(
            classify(Ok(ProviderReply::status_only(404))),
            ProviderOutcome::Terminal(CompletionError::Unavailable)
        );
    }

    #[test]
    fn decide_retries_while_attempts_remain() {
        let policy = RetryPolicy::default();

        assert_eq!(
            policy.decide(retryable(RetryReason::RateLimited), 0),
            AttemptDecision::Retry(Duration::from_secs(1))
        );
        assert_eq!(
            policy.decide(retryable(RetryReason::Server(500)), 1),
            AttemptDecision::Retry(Duration::from_secs(2))
        );
    }

    #[test]
    fn decide_fails_once_exhausted() {
        let policy = RetryPolicy::default();

        assert_eq!(
            policy.decide(retryable(RetryReason::RateLimited), 2),
            AttemptDecision::Fail(CompletionError::RateLimited)
        );
        assert_eq!(
            policy.decide(retryable(RetryReason::Server(500)), 2),
            AttemptDecision::Fail(CompletionError::Server(ServerFault::Status(500)))
        );
        assert_eq!(
            policy.decide(retryable(RetryReason::Timeout), 2),
            AttemptDecision::Fail(CompletionError::Server(ServerFault::Timeout))
        );
    }

    #[test]
    fn exhausted_failure_prefers_provider_message() {
        let policy = RetryPolicy::new(RetryConfig {
            max_retries: 0,
            ..RetryConfig::default()
        });
        let outcome = ProviderOutcome::Retryable(RetryableFailure {
            reason: RetryReason::Server(500),
            provider_message: Some("Internal Server Error".to_string()),
        });

        assert_eq!(
            policy.decide(outcome, 0),
            AttemptDecision::Fail(CompletionError::Provider(
                "Internal Server Error".to_string()
            ))
        );
    }

    #[test]
    fn terminal_outcomes_never_retry() {
        let policy = RetryPolicy::default();

        assert_eq!(
            policy.decide(ProviderOutcome::Terminal(CompletionError::Authentication), 0),
            AttemptDecision::Fail(CompletionError::Authentication)
        );
        assert_eq!(
            policy.decide(ProviderOutcome::Terminal(CompletionError::EmptyReply), 0),
            AttemptDecision::Fail(CompletionError::EmptyReply)
        );
    }
}
