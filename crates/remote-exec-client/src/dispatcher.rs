//! Local/remote call dispatch.

use std::sync::Arc;

use remote_exec_core::{CallDescriptor, CodeBundle, ExecRequest, WireResponse};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::{
    BundleError, Console, Definition, DispatcherConfig, ExecTransport, HelperRegistry,
    RawResponse, StdoutConsole, TransportError, build_bundle,
    console::{STDOUT_HEADER, TRACEBACK_HEADER},
};

/// Signature of the local implementation wrapped by a dispatcher.
pub type LocalFn<E> = dyn Fn(&[Value], &Map<String, Value>) -> Result<Value, E> + Send + Sync;

/// Dispatch error.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error(transparent)]
    Bundle(#[from] BundleError),
    #[error("Remote returned non-JSON body: {body}")]
    Protocol { body: String },
    #[error("Remote call timed out after {0:?}")]
    Timeout(std::time::Duration),
    #[error("Transport error: {0}")]
    Transport(#[source] TransportError),
    #[error("Remote execution failed: {message}")]
    RemoteExecution {
        message: String,
        traceback: Option<String>,
        stdout: Option<String>,
    },
    #[error("No transport configured")]
    NoTransport,
}

impl From<TransportError> for DispatchError {
    fn from(err: TransportError) -> Self {
        match err {
            TransportError::Timeout(after) => Self::Timeout(after),
            other => Self::Transport(other),
        }
    }
}

/// Runs one function either locally or on a remote executor.
///
/// The local implementation and the shipped bundle must behave the same;
/// the dispatcher only chooses which one runs, on every call.
pub struct Dispatcher<E = DispatchError> {
    entry_name: String,
    local: Box<LocalFn<E>>,
    bundle: CodeBundle,
    endpoint: String,
    config: DispatcherConfig,
    transport: Arc<dyn ExecTransport>,
    console: Arc<dyn Console>,
}

impl<E> std::fmt::Debug for Dispatcher<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("entry_name", &self.entry_name)
            .field("endpoint", &self.endpoint)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl<E> Dispatcher<E>
where
    E: From<DispatchError>,
{
    /// Start building a dispatcher for `entry`, implemented locally by `local`.
    #[must_use]
    pub fn builder<F>(entry: Definition, local: F) -> DispatcherBuilder<E>
    where
        F: Fn(&[Value], &Map<String, Value>) -> Result<Value, E> + Send + Sync + 'static,
    {
        DispatcherBuilder::new(entry, Box::new(local))
    }

    /// Entry point name sent with every remote call.
    #[must_use]
    pub fn entry_name(&self) -> &str {
        &self.entry_name
    }

    /// Bundle built when the dispatcher was constructed.
    #[must_use]
    pub const fn bundle(&self) -> &CodeBundle {
        &self.bundle
    }

    /// Resolved `/exec` endpoint.
    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Call the function, locally or remotely depending on the switch.
    ///
    /// # Errors
    /// On the local path, whatever the local implementation returns.
    /// On the remote path, any `DispatchError` converted into `E`.
    pub async fn call(&self, args: Vec<Value>, kwargs: Map<String, Value>) -> Result<Value, E> {
        if !self.config.switch.is_enabled() {
            tracing::debug!(entry = %self.entry_name, "Running locally");
            return (self.local)(args.as_slice(), &kwargs);
        }

        let call = CallDescriptor::new(self.entry_name.clone())
            .with_args(args)
            .with_kwargs(kwargs);
        self.call_remote(call).await.map_err(E::from)
    }

    /// Run the local implementation, ignoring the switch.
    ///
    /// # Errors
    /// Whatever the local implementation returns.
    pub fn call_local(&self, args: &[Value], kwargs: &Map<String, Value>) -> Result<Value, E> {
        (self.local)(args, kwargs)
    }

    /// Submit `call` to the remote executor, ignoring the switch.
    ///
    /// # Errors
    /// Returns error on transport failure, timeout, a non-conforming body,
    /// or a failure reported by the executor.
    pub async fn call_remote(&self, call: CallDescriptor) -> Result<Value, DispatchError> {
        tracing::info!(entry = %call.func_name, endpoint = %self.endpoint, "Running remotely");
        let request = ExecRequest::new(&self.bundle, call);

        let response = self
            .transport
            .submit(&self.endpoint, &request, self.config.timeout)
            .await
            .inspect_err(|e| tracing::error!("Remote call to {} failed: {e}", self.endpoint))?;

        decode_response(response, &self.config, self.console.as_ref())
    }
}

/// Turn a raw response into the call's result, replaying output as configured.
///
/// The body's `status` field decides success; the HTTP status is only used
/// as the error message when the body carries none.
///
/// # Errors
/// `Protocol` if the body is not a JSON object, `RemoteExecution` if the
/// executor reported a failure.
pub fn decode_response(
    response: RawResponse,
    config: &DispatcherConfig,
    console: &dyn Console,
) -> Result<Value, DispatchError> {
    let Ok(data) = WireResponse::decode(&response.body) else {
        tracing::error!(status = response.status, "Non-JSON response body");
        return Err(DispatchError::Protocol {
            body: response.body,
        });
    };

    if config.echo_stdout {
        if let Some(stdout) = data.stdout() {
            console.emit(STDOUT_HEADER, stdout);
        }
    }

    if data.is_ok() {
        return Ok(data.result.unwrap_or(Value::Null));
    }

    if config.echo_traceback {
        if let Some(traceback) = data.traceback() {
            console.emit(TRACEBACK_HEADER, traceback);
        }
    }

    let message = data
        .error()
        .map_or_else(|| format!("HTTP {}", response.status), str::to_string);
    tracing::error!("Remote execution failed: {message}");

    Err(DispatchError::RemoteExecution {
        message,
        traceback: data.traceback,
        stdout: data.stdout,
    })
}

/// Builder for `Dispatcher`.
pub struct DispatcherBuilder<E> {
    entry: Definition,
    local: Box<LocalFn<E>>,
    registry: Option<HelperRegistry>,
    config: DispatcherConfig,
    transport: Option<Arc<dyn ExecTransport>>,
    console: Option<Arc<dyn Console>>,
}

impl<E> DispatcherBuilder<E>
where
    E: From<DispatchError>,
{
    fn new(entry: Definition, local: Box<LocalFn<E>>) -> Self {
        Self {
            entry,
            local,
            registry: None,
            config: DispatcherConfig::default(),
            transport: None,
            console: None,
        }
    }

    /// Include the helpers registered in `registry`, as of `build`.
    #[must_use]
    pub fn helpers(mut self, registry: &HelperRegistry) -> Self {
        self.registry = Some(registry.clone());
        self
    }

    #[must_use]
    pub fn config(mut self, config: DispatcherConfig) -> Self {
        self.config = config;
        self
    }

    /// Override the transport (defaults to HTTP).
    #[must_use]
    pub fn transport(mut self, transport: Arc<dyn ExecTransport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Override where remote output is replayed (defaults to stdout).
    #[must_use]
    pub fn console(mut self, console: Arc<dyn Console>) -> Self {
        self.console = Some(console);
        self
    }

    /// Build the bundle and the dispatcher.
    ///
    /// # Errors
    /// Returns `DispatchError::Bundle` if any source is unavailable, or
    /// `DispatchError::NoTransport` if none was given and the `http`
    /// feature is disabled.
    pub fn build(self) -> Result<Dispatcher<E>, DispatchError> {
        let helpers = self
            .registry
            .as_ref()
            .map(HelperRegistry::snapshot)
            .unwrap_or_default();
        let bundle = build_bundle(&self.entry, &helpers)?;
        let endpoint = self.config.resolve_endpoint();
        let transport = match self.transport {
            Some(transport) => transport,
            None => default_transport()?,
        };

        Ok(Dispatcher {
            entry_name: self.entry.name().to_string(),
            local: self.local,
            bundle,
            endpoint,
            config: self.config,
            transport,
            console: self.console.unwrap_or_else(|| Arc::new(StdoutConsole)),
        })
    }
}

#[cfg(feature = "http")]
#[allow(clippy::unnecessary_wraps)]
fn default_transport() -> Result<Arc<dyn ExecTransport>, DispatchError> {
    Ok(Arc::new(crate::HttpTransport::new()))
}

#[cfg(not(feature = "http"))]
fn default_transport() -> Result<Arc<dyn ExecTransport>, DispatchError> {
    Err(DispatchError::NoTransport)
}
