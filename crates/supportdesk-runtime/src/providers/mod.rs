//! Completion provider transports
//!
//! Concrete implementations of the [`crate::CompletionTransport`] trait.

pub mod openrouter;

pub use openrouter::OpenRouterTransport;
