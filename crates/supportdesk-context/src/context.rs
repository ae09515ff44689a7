//! Conversation context handed to request assembly

use crate::turn::Turn;
use crate::window::ContextWindow;

/// Prior history plus the pending user turn.
///
/// Only used as input when building a provider request; persistence of
/// conversations lives outside this crate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversationContext<'a> {
    history: &'a [Turn],
    pending: Turn,
}

impl<'a> ConversationContext<'a> {
    pub fn new(history: &'a [Turn], user_message: impl Into<String>) -> Self {
        Self {
            history,
            pending: Turn::user(user_message),
        }
    }

    pub fn history(&self) -> &'a [Turn] {
        self.history
    }

    pub fn pending(&self) -> &Turn {
        &self.pending
    }

    /// Windowed history followed by the pending user turn.
    pub fn windowed(&self, window: ContextWindow) -> impl Iterator<Item = &Turn> + '_ {
        window
            .apply(self.history)
            .iter()
            .chain(std::iter::once(&self.pending))
    }
}
