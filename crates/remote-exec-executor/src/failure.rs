//! Evaluation failures.

use remote_exec_core::ExecutionOutcome;
use rquickjs::{CaughtError, convert::Coerced};
use thiserror::Error;

/// Anything that went wrong while evaluating a bundle or calling its entry.
///
/// Syntax errors, a missing entry point, argument conversion problems and
/// exceptions thrown by user code all end up here, undifferentiated.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct EvaluationFailure {
    /// Short human-readable message.
    pub message: String,
    /// Full diagnostic trace.
    pub trace: String,
}

impl EvaluationFailure {
    /// Create a failure with an explicit error class used as the trace header.
    #[must_use]
    pub fn new(kind: &str, message: impl Into<String>) -> Self {
        let message = message.into();
        let trace = format!("{kind}: {message}\n");
        Self { message, trace }
    }

    /// Failure raised by the interpreter itself rather than by user code.
    #[must_use]
    pub fn engine(err: &rquickjs::Error) -> Self {
        Self::new("InternalError", err.to_string())
    }

    /// Convert whatever the interpreter caught into a failure.
    #[must_use]
    pub fn from_caught(caught: CaughtError<'_>) -> Self {
        match caught {
            CaughtError::Exception(exception) => {
                let message = exception.message().unwrap_or_default();
                let kind = exception
                    .as_object()
                    .get::<_, Option<String>>("name")
                    .ok()
                    .flatten()
                    .unwrap_or_else(|| "Error".to_string());
                let stack = exception.stack().unwrap_or_default();
                let mut trace = format!("{kind}: {message}\n");
                trace.push_str(&stack);
                Self { message, trace }
            }
            CaughtError::Value(value) => {
                let message = value
                    .get::<Coerced<String>>()
                    .map_or_else(|_| "uncaught non-error value".to_string(), |c| c.0);
                Self::new("Uncaught", message)
            }
            CaughtError::Error(err) => Self::engine(&err),
        }
    }

    /// Wrap the failure together with the output captured before it.
    #[must_use]
    pub fn into_outcome(self, stdout: String) -> ExecutionOutcome {
        ExecutionOutcome::Failure {
            error: self.message,
            traceback: self.trace,
            stdout,
        }
    }
}
