//! Chat orchestration: validate, persist, generate, persist.

use std::sync::Arc;

use serde::Serialize;
use supportdesk_context::{Role, Turn};
use supportdesk_runtime::ReplyGenerator;
use tokio::time::Instant;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::db::ConversationRepository;
use crate::error::GatewayError;
use crate::metrics;

/// Longest user message forwarded to the provider, in characters.
pub const DEFAULT_MAX_MESSAGE_CHARS: usize = 1000;

const EMPTY_MESSAGE: &str = "Message is required and cannot be empty.";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatReply {
    pub reply: String,
    pub session_id: String,
}

pub struct ChatService {
    repository: Arc<dyn ConversationRepository>,
    generator: Arc<dyn ReplyGenerator>,
    max_message_chars: usize,
}

impl ChatService {
    pub fn new(
        repository: Arc<dyn ConversationRepository>,
        generator: Arc<dyn ReplyGenerator>,
    ) -> Self {
        Self {
            repository,
            generator,
            max_message_chars: DEFAULT_MAX_MESSAGE_CHARS,
        }
    }

    pub fn with_max_message_chars(mut self, max_message_chars: usize) -> Self {
        self.max_message_chars = max_message_chars;
        self
    }

    /// Store the user turn, generate a reply from the history that preceded it
    /// and store the reply.
    ///
    /// The user turn stays stored when generation fails.
    pub async fn send_message(
        &self,
        message: Option<&str>,
        session_id: Option<&str>,
    ) -> Result<ChatReply, GatewayError> {
        metrics::CHAT_REQUESTS_TOTAL.inc();
        let result = self.relay(message, session_id).await;
        if let Err(e) = &result {
            metrics::CHAT_ERRORS.with_label_values(&[e.kind()]).inc();
        }
        result
    }

    async fn relay(
        &self,
        message: Option<&str>,
        session_id: Option<&str>,
    ) -> Result<ChatReply, GatewayError> {
        let message = message
            .filter(|m| !m.trim().is_empty())
            .ok_or_else(|| GatewayError::invalid_input(EMPTY_MESSAGE))?;
        let message = truncate_chars(message, self.max_message_chars);

        let session_id = session_id
            .filter(|id| !id.is_empty())
            .map_or_else(|| Uuid::new_v4().to_string(), str::to_string);

        self.repository.create_conversation(&session_id).await?;
        // History is read before the user turn is stored.
        let turns = self.repository.list_turns(&session_id).await?;
        self.repository
            .append_turn(&session_id, Role::User, message)
            .await?;
        debug!(session_id = %session_id, history = turns.len(), "generating reply");

        let started = Instant::now();
        let reply = self.generator.generate_reply(&turns, message).await;
        metrics::REPLY_LATENCY.observe(started.elapsed().as_secs_f64());
        let reply = reply.inspect_err(|e| {
            warn!(session_id = %session_id, kind = e.kind(), error = %e, "chat reply failed");
        })?;

        self.repository
            .append_turn(&session_id, Role::Assistant, &reply)
            .await?;
        info!(session_id = %session_id, "chat reply stored");

        Ok(ChatReply { reply, session_id })
    }

    pub async fn history(&self, session_id: &str) -> Result<Vec<Turn>, GatewayError> {
        metrics::HISTORY_REQUESTS_TOTAL.inc();
        Ok(self.repository.list_turns(session_id).await?)
    }
}

fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
