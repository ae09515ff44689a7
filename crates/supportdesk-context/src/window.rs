//! Context window management

use serde::{Deserialize, Serialize};

use crate::turn::Turn;

/// Number of history turns kept by the default window.
pub const DEFAULT_MAX_TURNS: usize = 10;

/// Context window configuration.
///
/// Bounds request size by keeping only the most recent turns. Older turns are
/// dropped first; the newest turn is never dropped while the window is
/// non-empty.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct ContextWindow {
    /// Maximum number of history turns in the window
    pub max_turns: usize,
}

impl Default for ContextWindow {
    fn default() -> Self {
        Self {
            max_turns: DEFAULT_MAX_TURNS,
        }
    }
}

impl ContextWindow {
    pub fn new(max_turns: usize) -> Self {
        Self { max_turns }
    }

    /// Return the last `max_turns` turns of `turns`, in their original order.
    pub fn apply<'a>(&self, turns: &'a [Turn]) -> &'a [Turn] {
        let start = turns.len().saturating_sub(self.max_turns);
        &turns[start..]
    }
}
