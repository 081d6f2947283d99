//! Server configuration.

use std::net::SocketAddr;

use thiserror::Error;

/// Environment variable overriding the bind address.
pub const ADDR_ENV: &str = "REMOTE_EXEC_ADDR";
/// Bind address used when nothing else is configured.
pub const DEFAULT_ADDR: &str = "0.0.0.0:5005";

/// Server configuration error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("Invalid bind address: {0}")]
    InvalidAddr(String),
}

/// Server settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServerConfig {
    pub addr: SocketAddr,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: SocketAddr::from(([0, 0, 0, 0], 5005)),
        }
    }
}

impl ServerConfig {
    /// Create a config bound to `addr`.
    #[must_use]
    pub const fn new(addr: SocketAddr) -> Self {
        Self { addr }
    }

    /// Resolve from the process environment.
    ///
    /// # Errors
    /// Returns `ConfigError::InvalidAddr` if `REMOTE_EXEC_ADDR` is not a socket address.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::resolve_with(None, |key| std::env::var(key).ok())
    }

    /// Resolve the address: explicit > `REMOTE_EXEC_ADDR` > `0.0.0.0:5005`.
    ///
    /// # Errors
    /// Returns `ConfigError::InvalidAddr` if the chosen address does not parse.
    pub fn resolve_with<F>(explicit: Option<&str>, env: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_blank = |v: &String| !v.trim().is_empty();
        let raw = explicit
            .map(str::to_string)
            .filter(non_blank)
            .or_else(|| env(ADDR_ENV).filter(non_blank))
            .unwrap_or_else(|| DEFAULT_ADDR.to_string());

        raw.trim()
            .parse()
            .map(Self::new)
            .map_err(|_| ConfigError::InvalidAddr(raw.clone()))
    }
}
