//! SupportDesk Context - conversation turns and context windowing
//!
//! This crate provides:
//! - The immutable [`Turn`] data model
//! - Context windowing over conversation history
//! - The conversation context handed to request assembly

pub mod context;
pub mod error;
pub mod turn;
pub mod window;

pub use context::ConversationContext;
pub use error::{ContextError, ContextResult};
pub use turn::{Role, Turn};
pub use window::{ContextWindow, DEFAULT_MAX_TURNS};

/// Prelude for common imports
pub mod prelude {
    pub use crate::context::ConversationContext;
    pub use crate::error::{ContextError, ContextResult};
    pub use crate::turn::{Role, Turn};
    pub use crate::window::ContextWindow;
}
