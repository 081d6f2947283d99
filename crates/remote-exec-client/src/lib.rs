//! Client side of remote function execution.
//!
//! Provides:
//! - `HelperRegistry` / `Definition` - Sources shipped with every bundle
//! - `build_bundle` - Turn definitions into a `CodeBundle`
//! - `Dispatcher` - Run a function locally or on a remote executor per call
//! - `ExecTransport` - Request submission (HTTP via feature: http)

pub mod bundler;
pub mod config;
pub mod console;
pub mod definition;
pub mod dispatcher;
pub mod registry;
pub mod transport;

pub use bundler::{BundleError, build_bundle};
pub use config::{DispatcherConfig, RemoteSwitch};
pub use console::{BufferConsole, Console, StdoutConsole};
pub use definition::{Definition, SourceText};
pub use dispatcher::{DispatchError, Dispatcher, DispatcherBuilder};
pub use registry::HelperRegistry;
#[cfg(feature = "http")]
pub use transport::HttpTransport;
pub use transport::{ExecTransport, RawResponse, TransportError};
