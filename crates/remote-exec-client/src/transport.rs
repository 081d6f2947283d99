//! Request submission to a remote executor.

use std::time::Duration;

use async_trait::async_trait;
use remote_exec_core::ExecRequest;
use thiserror::Error;

/// Status and body of a response, whatever the status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    pub body: String,
}

impl RawResponse {
    #[must_use]
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }
}

/// Failure before a response body was received.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("Request timed out after {0:?}")]
    Timeout(Duration),
    #[error("Connection failed: {0}")]
    Connect(String),
    #[error("HTTP error: {0}")]
    Http(String),
}

/// Trait for submitting execution requests.
///
/// Implementations return the response body for every status code; only a
/// failure to obtain a body at all is an error.
#[async_trait]
pub trait ExecTransport: Send + Sync {
    /// Send one request and wait for its response, up to `timeout`.
    async fn submit(
        &self,
        endpoint: &str,
        request: &ExecRequest,
        timeout: Duration,
    ) -> Result<RawResponse, TransportError>;
}

#[cfg(feature = "http")]
pub use http::HttpTransport;

#[cfg(feature = "http")]
mod http {
    use super::{ExecTransport, RawResponse, TransportError};

    use std::time::Duration;

    use async_trait::async_trait;
    use remote_exec_core::ExecRequest;

    /// JSON-over-HTTP transport.
    #[derive(Debug, Clone, Default)]
    pub struct HttpTransport {
        client: reqwest::Client,
    }

    impl HttpTransport {
        /// Create a transport with a default client.
        #[must_use]
        pub fn new() -> Self {
            Self::default()
        }

        /// Create a transport reusing an existing client.
        #[must_use]
        pub const fn with_client(client: reqwest::Client) -> Self {
            Self { client }
        }
    }

    #[async_trait]
    impl ExecTransport for HttpTransport {
        async fn submit(
            &self,
            endpoint: &str,
            request: &ExecRequest,
            timeout: Duration,
        ) -> Result<RawResponse, TransportError> {
            let response = self
                .client
                .post(endpoint)
                .timeout(timeout)
                .json(request)
                .send()
                .await
                .map_err(|e| classify(&e, timeout))?;

            let status = response.status().as_u16();
            let body = response.text().await.map_err(|e| classify(&e, timeout))?;
            Ok(RawResponse { status, body })
        }
    }

    fn classify(err: &reqwest::Error, timeout: Duration) -> TransportError {
        if err.is_timeout() {
            TransportError::Timeout(timeout)
        } else if err.is_connect() {
            TransportError::Connect(err.to_string())
        } else {
            TransportError::Http(err.to_string())
        }
    }
}
