//! QuickJS-backed executor.

use async_trait::async_trait;
use remote_exec_core::{CallDescriptor, CodeBundle, ExecutionOutcome, Executor};
use rquickjs::{
    CatchResultExt, Context, Ctx, Function, Object, Runtime, Value,
    convert::Coerced,
    function::Rest,
};

use crate::{EvaluationFailure, OutputCapture};

/// Console methods routed into the call's capture buffer.
const CONSOLE_METHODS: [&str; 5] = ["log", "info", "debug", "warn", "error"];

/// Executor evaluating JavaScript bundles in an embedded QuickJS engine.
///
/// Every call gets its own runtime, context and output buffer. Nothing is
/// shared between calls, so concurrent executions need no locking.
#[derive(Debug, Clone, Copy, Default)]
pub struct QuickJsExecutor;

impl QuickJsExecutor {
    /// Create a new executor.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Evaluate `bundle` and invoke `call` on the current thread.
    ///
    /// Never fails: every problem is reported as an `ExecutionOutcome::Failure`
    /// carrying the output produced before it happened.
    #[must_use]
    pub fn execute_blocking(&self, bundle: &CodeBundle, call: &CallDescriptor) -> ExecutionOutcome {
        let capture = OutputCapture::new();
        let result = evaluate(bundle, call, &capture);
        let stdout = capture.take();

        match result {
            Ok(result) => ExecutionOutcome::Success { result, stdout },
            Err(failure) => failure.into_outcome(stdout),
        }
    }
}

#[async_trait]
impl Executor for QuickJsExecutor {
    async fn execute(&self, bundle: CodeBundle, call: CallDescriptor) -> ExecutionOutcome {
        let func_name = call.func_name.clone();
        tracing::info!("Executing {func_name}");

        let executor = *self;
        let outcome =
            match tokio::task::spawn_blocking(move || executor.execute_blocking(&bundle, &call))
                .await
            {
                Ok(outcome) => outcome,
                Err(e) => EvaluationFailure::new("InternalError", format!("executor task failed: {e}"))
                    .into_outcome(String::new()),
            };

        match &outcome {
            ExecutionOutcome::Success { .. } => {
                tracing::info!("Execution of {func_name} succeeded");
            }
            ExecutionOutcome::Failure { error, .. } => {
                tracing::error!("Execution error in {func_name}: {error}");
            }
        }
        outcome
    }
}

fn evaluate(
    bundle: &CodeBundle,
    call: &CallDescriptor,
    capture: &OutputCapture,
) -> Result<serde_json::Value, EvaluationFailure> {
    let runtime = Runtime::new().map_err(|e| EvaluationFailure::engine(&e))?;
    let context = Context::full(&runtime).map_err(|e| EvaluationFailure::engine(&e))?;

    context.with(|ctx| {
        install_console(&ctx, capture)
            .catch(&ctx)
            .map_err(EvaluationFailure::from_caught)?;

        let lookup = EntryLookup::prepare(&ctx, &call.func_name)?;

        ctx.eval::<Value, _>(bundle.source())
            .catch(&ctx)
            .map_err(EvaluationFailure::from_caught)?;

        let entry = lookup.resolve(&ctx, &call.func_name)?;
        let argv = call_arguments(&ctx, call)?;

        let returned: Value = entry
            .call((Rest(argv),))
            .catch(&ctx)
            .map_err(EvaluationFailure::from_caught)?;

        to_json(&ctx, returned)
    })
}

/// Replace `console` and `print` with writers into `capture`.
fn install_console<'js>(ctx: &Ctx<'js>, capture: &OutputCapture) -> rquickjs::Result<()> {
    let globals = ctx.globals();
    let console = Object::new(ctx.clone())?;
    for method in CONSOLE_METHODS {
        console.set(method, capture_fn(ctx, capture)?)?;
    }
    globals.set("console", console)?;
    globals.set("print", capture_fn(ctx, capture)?)?;
    Ok(())
}

fn capture_fn<'js>(ctx: &Ctx<'js>, capture: &OutputCapture) -> rquickjs::Result<Function<'js>> {
    let capture = capture.clone();
    Function::new(ctx.clone(), move |parts: Rest<Coerced<String>>| {
        capture.write_line(parts.0.into_iter().map(|part| part.0));
    })
}

/// Reads an own property of the global object, ignoring its prototype chain.
const OWN_GLOBAL: &str = "(function (name) { \
    return Object.prototype.hasOwnProperty.call(globalThis, name) ? globalThis[name] : undefined; \
})";

/// Finds the entry point among the bindings the bundle itself created.
///
/// Built-ins and everything the global object inherits exist before the
/// bundle runs, so they are never valid entry points. `function` and `var`
/// declarations land on the global object; `const`, `let` and `class`
/// bindings only in the global lexical scope, where they are found by
/// evaluating the bare identifier.
struct EntryLookup<'js> {
    own_global: Function<'js>,
    same_value: Function<'js>,
    before: Value<'js>,
}

impl<'js> EntryLookup<'js> {
    /// Record the global binding for `name` as it is before the bundle runs.
    fn prepare(ctx: &Ctx<'js>, name: &str) -> Result<Self, EvaluationFailure> {
        if !is_identifier(name) {
            return Err(EvaluationFailure::new(
                "SyntaxError",
                format!("invalid entry point name '{name}'"),
            ));
        }

        let own_global: Function = ctx
            .eval(OWN_GLOBAL)
            .catch(ctx)
            .map_err(EvaluationFailure::from_caught)?;
        let same_value: Function = ctx
            .eval("Object.is")
            .catch(ctx)
            .map_err(EvaluationFailure::from_caught)?;
        let before: Value = own_global
            .call((name,))
            .catch(ctx)
            .map_err(EvaluationFailure::from_caught)?;

        Ok(Self {
            own_global,
            same_value,
            before,
        })
    }

    fn resolve(&self, ctx: &Ctx<'js>, name: &str) -> Result<Function<'js>, EvaluationFailure> {
        let entry = self.defined_by_bundle(ctx, name)?.ok_or_else(|| {
            EvaluationFailure::new(
                "ReferenceError",
                format!("entry point '{name}' is not defined"),
            )
        })?;

        entry.as_function().cloned().ok_or_else(|| {
            EvaluationFailure::new(
                "TypeError",
                format!("entry point '{name}' is not a function"),
            )
        })
    }

    fn defined_by_bundle(
        &self,
        ctx: &Ctx<'js>,
        name: &str,
    ) -> Result<Option<Value<'js>>, EvaluationFailure> {
        let own: Value = self
            .own_global
            .call((name,))
            .catch(ctx)
            .map_err(EvaluationFailure::from_caught)?;
        if !own.is_undefined() && !self.same(ctx, &self.before, &own)? {
            return Ok(Some(own));
        }

        let lexical: Value = ctx
            .eval(format!("typeof {name} === 'undefined' ? undefined : {name}"))
            .catch(ctx)
            .map_err(EvaluationFailure::from_caught)?;
        if lexical.is_undefined() {
            return Ok(None);
        }

        // Anything still visible through the global object is not lexical.
        let through_global: Value = ctx
            .globals()
            .get(name)
            .catch(ctx)
            .map_err(EvaluationFailure::from_caught)?;
        if self.same(ctx, &lexical, &through_global)? {
            Ok(None)
        } else {
            Ok(Some(lexical))
        }
    }

    fn same(
        &self,
        ctx: &Ctx<'js>,
        a: &Value<'js>,
        b: &Value<'js>,
    ) -> Result<bool, EvaluationFailure> {
        self.same_value
            .call((a.clone(), b.clone()))
            .catch(ctx)
            .map_err(EvaluationFailure::from_caught)
    }
}

/// Positional arguments, followed by the keyword arguments as one object
/// when any were given.
fn call_arguments<'js>(
    ctx: &Ctx<'js>,
    call: &CallDescriptor,
) -> Result<Vec<Value<'js>>, EvaluationFailure> {
    let mut argv = call
        .args
        .iter()
        .map(|arg| to_js(ctx, arg))
        .collect::<Result<Vec<_>, _>>()?;

    if !call.kwargs.is_empty() {
        let kwargs = serde_json::Value::Object(call.kwargs.clone());
        argv.push(to_js(ctx, &kwargs)?);
    }
    Ok(argv)
}

fn to_js<'js>(ctx: &Ctx<'js>, value: &serde_json::Value) -> Result<Value<'js>, EvaluationFailure> {
    ctx.json_parse(value.to_string())
        .catch(ctx)
        .map_err(EvaluationFailure::from_caught)
}

/// Convert a returned value to JSON; `undefined` and functions become `null`.
fn to_json<'js>(ctx: &Ctx<'js>, value: Value<'js>) -> Result<serde_json::Value, EvaluationFailure> {
    let Some(text) = ctx
        .json_stringify(value)
        .catch(ctx)
        .map_err(EvaluationFailure::from_caught)?
    else {
        return Ok(serde_json::Value::Null);
    };

    let text = text.to_string().map_err(|e| EvaluationFailure::engine(&e))?;
    serde_json::from_str(&text).map_err(|e| {
        EvaluationFailure::new("TypeError", format!("return value is not serializable: {e}"))
    })
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    chars
        .next()
        .is_some_and(|c| c.is_alphabetic() || c == '_' || c == '$')
        && chars.all(|c| c.is_alphanumeric() || c == '_' || c == '$')
}
