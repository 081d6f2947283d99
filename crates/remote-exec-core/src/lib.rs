//! Core abstractions for remote function execution.
//!
//! This crate provides the fundamental building blocks:
//! - `CodeBundle` - Self-contained source shipped to the executor
//! - `CallDescriptor` - Entry point name plus call arguments
//! - `ExecRequest` / `ExecutionOutcome` - The `/exec` wire protocol
//! - `Executor` trait

pub mod bundle;
pub mod protocol;
pub mod traits;

pub use bundle::{CallDescriptor, CodeBundle};
pub use protocol::{ExecRequest, ExecutionOutcome, WireResponse};
pub use traits::Executor;
