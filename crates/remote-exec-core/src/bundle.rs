//! Code bundles and call descriptors.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Separator placed between bundle fragments.
const FRAGMENT_SEPARATOR: &str = "\n\n";

/// Self-contained source text evaluated by an executor.
///
/// Fragments keep their original order: helpers first, entry function last.
/// The concatenated source is computed once and never changes afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeBundle {
    fragments: Vec<String>,
    source: String,
}

impl CodeBundle {
    /// Build a bundle from ordered fragments.
    ///
    /// Empty fragments are dropped so they do not leave stray separators.
    #[must_use]
    pub fn from_fragments<I, S>(fragments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let fragments: Vec<String> = fragments
            .into_iter()
            .map(Into::into)
            .filter(|f| !f.trim().is_empty())
            .collect();
        let source = fragments.join(FRAGMENT_SEPARATOR);
        Self { fragments, source }
    }

    /// Wrap already concatenated source, as received over the wire.
    #[must_use]
    pub fn from_source(source: impl Into<String>) -> Self {
        let source = source.into();
        Self {
            fragments: vec![source.clone()],
            source,
        }
    }

    /// The evaluable source text.
    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    /// The fragments in bundle order.
    #[must_use]
    pub fn fragments(&self) -> &[String] {
        &self.fragments
    }

    /// Consume the bundle, returning its source text.
    #[must_use]
    pub fn into_source(self) -> String {
        self.source
    }
}

/// Names the entry point of a bundle and carries the call arguments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallDescriptor {
    /// Symbol invoked after the bundle is evaluated.
    pub func_name: String,

    /// Positional arguments.
    #[serde(default)]
    pub args: Vec<Value>,

    /// Keyword arguments.
    #[serde(default)]
    pub kwargs: Map<String, Value>,
}

impl CallDescriptor {
    /// Create a descriptor with no arguments.
    #[must_use]
    pub fn new(func_name: impl Into<String>) -> Self {
        Self {
            func_name: func_name.into(),
            args: Vec::new(),
            kwargs: Map::new(),
        }
    }

    /// Replace the positional arguments.
    #[must_use]
    pub fn with_args(mut self, args: Vec<Value>) -> Self {
        self.args = args;
        self
    }

    /// Replace the keyword arguments.
    #[must_use]
    pub fn with_kwargs(mut self, kwargs: Map<String, Value>) -> Self {
        self.kwargs = kwargs;
        self
    }

    /// Append one positional argument.
    #[must_use]
    pub fn arg(mut self, value: impl Into<Value>) -> Self {
        self.args.push(value.into());
        self
    }

    /// Set one keyword argument, replacing any previous value for `key`.
    #[must_use]
    pub fn kwarg(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.kwargs.insert(key.into(), value.into());
        self
    }
}
