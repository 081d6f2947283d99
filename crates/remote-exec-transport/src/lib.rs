//! HTTP transport for the remote execution protocol.
//!
//! Provides:
//! - `router` - Axum router with `POST /exec` and the `GET /` liveness probe
//! - `ServerConfig` - Bind address resolution
//! - `serve` / `serve_listener` - Run the router

pub mod config;
pub mod server;

pub use config::{ConfigError, ServerConfig};
pub use server::{ServeError, router, serve, serve_listener};
