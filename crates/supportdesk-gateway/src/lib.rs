//! SupportDesk Gateway
//!
//! HTTP front for the support chat:
//! - chat message relay and history lookup
//! - conversation persistence (in-memory or SQLite)
//! - Prometheus metrics

pub mod config;
pub mod db;
pub mod error;
pub mod metrics;
pub mod router;
pub mod service;

pub use config::GatewayConfig;
pub use error::GatewayError;
pub use router::build_routes;
pub use service::{ChatReply, ChatService};

/// Gateway version
pub const GATEWAY_VERSION: &str = env!("CARGO_PKG_VERSION");
