//! Wire protocol for the `/exec` endpoint.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{CallDescriptor, CodeBundle};

/// HTTP status sent with a successful outcome.
pub const STATUS_OK: u16 = 200;
/// HTTP status sent with a failed outcome.
pub const STATUS_FAILED: u16 = 500;

/// Request body posted by the client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecRequest {
    /// Concatenated bundle source.
    pub code: String,
    /// Entry point name.
    pub func_name: String,
    /// Positional arguments.
    #[serde(default)]
    pub args: Vec<Value>,
    /// Keyword arguments.
    #[serde(default)]
    pub kwargs: Map<String, Value>,
}

impl ExecRequest {
    /// Pair a bundle with a call.
    #[must_use]
    pub fn new(bundle: &CodeBundle, call: CallDescriptor) -> Self {
        let CallDescriptor {
            func_name,
            args,
            kwargs,
        } = call;
        Self {
            code: bundle.source().to_string(),
            func_name,
            args,
            kwargs,
        }
    }

    /// Split the request back into bundle and call.
    #[must_use]
    pub fn into_parts(self) -> (CodeBundle, CallDescriptor) {
        let call = CallDescriptor {
            func_name: self.func_name,
            args: self.args,
            kwargs: self.kwargs,
        };
        (CodeBundle::from_source(self.code), call)
    }
}

/// Structured result of one execution, tagged by `status`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status")]
pub enum ExecutionOutcome {
    /// Entry point returned normally.
    #[serde(rename = "ok")]
    Success {
        result: Value,
        stdout: String,
    },
    /// Evaluation or invocation failed.
    #[serde(rename = "error")]
    Failure {
        error: String,
        traceback: String,
        stdout: String,
    },
}

impl ExecutionOutcome {
    /// Create a success outcome.
    #[must_use]
    pub fn success(result: Value, stdout: impl Into<String>) -> Self {
        Self::Success {
            result,
            stdout: stdout.into(),
        }
    }

    /// Create a failure outcome.
    #[must_use]
    pub fn failure(
        error: impl Into<String>,
        traceback: impl Into<String>,
        stdout: impl Into<String>,
    ) -> Self {
        Self::Failure {
            error: error.into(),
            traceback: traceback.into(),
            stdout: stdout.into(),
        }
    }

    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    /// Output captured during the call, whichever way it ended.
    #[must_use]
    pub fn stdout(&self) -> &str {
        match self {
            Self::Success { stdout, .. } | Self::Failure { stdout, .. } => stdout,
        }
    }

    /// HTTP status that accompanies this outcome on the wire.
    #[must_use]
    pub const fn http_status(&self) -> u16 {
        match self {
            Self::Success { .. } => STATUS_OK,
            Self::Failure { .. } => STATUS_FAILED,
        }
    }
}

/// Lenient view of a response body, as decoded by clients.
///
/// Every field is optional: the client only requires the body to be a JSON
/// object, and falls back to the HTTP status for a missing error message.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct WireResponse {
    pub status: Option<String>,
    pub result: Option<Value>,
    pub stdout: Option<String>,
    pub error: Option<String>,
    pub traceback: Option<String>,
}

impl WireResponse {
    /// Decode a raw response body.
    ///
    /// # Errors
    /// Returns error if the body is not a JSON object of the expected shape.
    pub fn decode(body: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(body)
    }

    /// Whether the executor reported success.
    #[must_use]
    pub fn is_ok(&self) -> bool {
        self.status.as_deref() == Some("ok")
    }

    /// Captured stdout, if any was sent and is non-empty.
    #[must_use]
    pub fn stdout(&self) -> Option<&str> {
        self.stdout.as_deref().filter(|s| !s.is_empty())
    }

    /// Diagnostic trace, if any was sent and is non-empty.
    #[must_use]
    pub fn traceback(&self) -> Option<&str> {
        self.traceback.as_deref().filter(|s| !s.is_empty())
    }

    /// Remote error text, if any was sent and is non-empty.
    #[must_use]
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref().filter(|s| !s.is_empty())
    }
}
