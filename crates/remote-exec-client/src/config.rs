//! Dispatcher configuration.

use std::{
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    time::Duration,
};

/// Environment variable switching remote execution on.
pub const ENABLE_ENV: &str = "USE_REMOTE_EXEC";
/// Environment variable overriding the default endpoint.
pub const ENDPOINT_ENV: &str = "REMOTE_EXEC_URL";
/// Endpoint used when neither an explicit value nor the environment gives one.
pub const DEFAULT_ENDPOINT: &str = "http://localhost:5005/exec";
/// Default request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Decides, per call, whether the remote path is taken.
#[derive(Debug, Clone, Default)]
pub enum RemoteSwitch {
    /// Read `USE_REMOTE_EXEC` on every call.
    #[default]
    Env,
    /// Always remote (`true`) or always local (`false`).
    Fixed(bool),
    /// Shared flag that can be flipped while the process runs.
    Shared(Arc<AtomicBool>),
}

impl RemoteSwitch {
    /// Whether the next call should run remotely.
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.is_enabled_with(|key| std::env::var(key).ok())
    }

    /// Same as `is_enabled`, reading the environment through `env`.
    #[must_use]
    pub fn is_enabled_with<F>(&self, env: F) -> bool
    where
        F: Fn(&str) -> Option<String>,
    {
        match self {
            Self::Env => env(ENABLE_ENV).is_some_and(|v| is_truthy(&v)),
            Self::Fixed(enabled) => *enabled,
            Self::Shared(flag) => flag.load(Ordering::SeqCst),
        }
    }
}

/// Truthy switch values: `true`, `1`, `yes` in any case.
#[must_use]
pub fn is_truthy(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "true" | "1" | "yes"
    )
}

/// Per-dispatcher settings.
#[derive(Debug, Clone)]
pub struct DispatcherConfig {
    /// Explicit `/exec` endpoint; wins over the environment.
    pub endpoint: Option<String>,
    /// Replay remote stdout locally.
    pub echo_stdout: bool,
    /// Replay the remote diagnostic trace locally on failure.
    pub echo_traceback: bool,
    /// Request timeout.
    pub timeout: Duration,
    /// Local/remote decision.
    pub switch: RemoteSwitch,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            echo_stdout: true,
            echo_traceback: true,
            timeout: DEFAULT_TIMEOUT,
            switch: RemoteSwitch::Env,
        }
    }
}

impl DispatcherConfig {
    /// Set an explicit endpoint.
    #[must_use]
    pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    #[must_use]
    pub const fn echo_stdout(mut self, enabled: bool) -> Self {
        self.echo_stdout = enabled;
        self
    }

    #[must_use]
    pub const fn echo_traceback(mut self, enabled: bool) -> Self {
        self.echo_traceback = enabled;
        self
    }

    #[must_use]
    pub const fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    #[must_use]
    pub fn switch(mut self, switch: RemoteSwitch) -> Self {
        self.switch = switch;
        self
    }

    /// Resolve the endpoint: explicit > `REMOTE_EXEC_URL` > default.
    #[must_use]
    pub fn resolve_endpoint(&self) -> String {
        self.resolve_endpoint_with(|key| std::env::var(key).ok())
    }

    /// Same as `resolve_endpoint`, reading the environment through `env`.
    #[must_use]
    pub fn resolve_endpoint_with<F>(&self, env: F) -> String
    where
        F: Fn(&str) -> Option<String>,
    {
        self.endpoint
            .clone()
            .filter(|e| !e.trim().is_empty())
            .or_else(|| env(ENDPOINT_ENV).filter(|e| !e.trim().is_empty()))
            .unwrap_or_else(|| DEFAULT_ENDPOINT.to_string())
    }
}
