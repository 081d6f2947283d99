//! QuickJS executor for remote code bundles.
//!
//! Provides:
//! - `QuickJsExecutor` - Fresh interpreter per call, implements `Executor`
//! - `OutputCapture` - Call-local console buffer
//! - `EvaluationFailure` - The single failure shape of an evaluation

pub mod capture;
pub mod failure;
pub mod quickjs;

pub use capture::OutputCapture;
pub use failure::EvaluationFailure;
pub use quickjs::QuickJsExecutor;
