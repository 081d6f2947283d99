//! Core execution trait.

use std::sync::Arc;

use async_trait::async_trait;

use crate::{CallDescriptor, CodeBundle, ExecutionOutcome};

/// Trait for code executors.
///
/// Implementations evaluate `bundle` in an environment of their own,
/// invoke `call.func_name` and report what happened. Failures are part of
/// the returned outcome; an executor never returns an error of its own.
#[async_trait]
pub trait Executor: Send + Sync {
    /// Evaluate a bundle and invoke its entry point.
    async fn execute(&self, bundle: CodeBundle, call: CallDescriptor) -> ExecutionOutcome;
}

#[async_trait]
impl<T> Executor for Arc<T>
where
    T: Executor + ?Sized,
{
    async fn execute(&self, bundle: CodeBundle, call: CallDescriptor) -> ExecutionOutcome {
        (**self).execute(bundle, call).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct EchoName;

    #[async_trait]
    impl Executor for EchoName {
        async fn execute(&self, _bundle: CodeBundle, call: CallDescriptor) -> ExecutionOutcome {
            ExecutionOutcome::success(json!(call.func_name), "")
        }
    }

    #[test]
    fn test_shared_executor_delegates() {
        let executor: Arc<dyn Executor> = Arc::new(EchoName);
        let outcome = tokio_test::block_on(
            executor.execute(CodeBundle::from_source(""), CallDescriptor::new("main")),
        );
        assert_eq!(outcome, ExecutionOutcome::success(json!("main"), ""));
    }

    #[test]
    fn test_nested_arc_delegates() {
        let executor = Arc::new(Arc::new(EchoName));
        let outcome = tokio_test::block_on(
            executor.execute(CodeBundle::from_source(""), CallDescriptor::new("nested")),
        );
        assert!(outcome.is_success());
    }
}
