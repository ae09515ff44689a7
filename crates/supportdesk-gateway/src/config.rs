//! Gateway process configuration

use std::net::SocketAddr;

use crate::service::DEFAULT_MAX_MESSAGE_CHARS;

pub const BIND_ADDR_ENV: &str = "SUPPORTDESK_BIND_ADDR";
pub const PORT_ENV: &str = "PORT";
pub const DATABASE_URL_ENV: &str = "DATABASE_URL";

pub const DEFAULT_PORT: u16 = 3001;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid bind address {value:?}: {source}")]
    BindAddr {
        value: String,
        source: std::net::AddrParseError,
    },
    #[error("invalid {PORT_ENV} {0:?}")]
    Port(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayConfig {
    pub bind_addr: SocketAddr,
    /// Only consulted when built with `persistence-sqlx`.
    pub database_url: Option<String>,
    pub max_message_chars: usize,
}

impl GatewayConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// `SUPPORTDESK_BIND_ADDR` wins over `PORT`, which binds on all interfaces.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let non_blank = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let bind_addr = match non_blank(BIND_ADDR_ENV) {
            Some(value) => value
                .parse()
                .map_err(|source| ConfigError::BindAddr { value, source })?,
            None => {
                let port = match non_blank(PORT_ENV) {
                    Some(value) => value.trim().parse().map_err(|_| ConfigError::Port(value))?,
                    None => DEFAULT_PORT,
                };
                SocketAddr::from(([0, 0, 0, 0], port))
            }
        };

        Ok(Self {
            bind_addr,
            database_url: non_blank(DATABASE_URL_ENV),
            max_message_chars: DEFAULT_MAX_MESSAGE_CHARS,
        })
    }
}
