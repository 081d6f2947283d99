//! Named source definitions.

use std::path::PathBuf;

use crate::BundleError;

/// Where a definition's source text comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceText {
    /// Source held in memory, typically via `include_str!`.
    Inline(String),
    /// Source read from disk when the bundle is built.
    File(PathBuf),
}

/// A named function or class whose source can be shipped to an executor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Definition {
    name: String,
    source: SourceText,
}

impl Definition {
    /// Definition backed by in-memory source.
    #[must_use]
    pub fn inline(name: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            source: SourceText::Inline(source.into()),
        }
    }

    /// Definition backed by a source file.
    #[must_use]
    pub fn file(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            source: SourceText::File(path.into()),
        }
    }

    /// Symbol the definition introduces.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub const fn source(&self) -> &SourceText {
        &self.source
    }

    /// Read the raw source text.
    ///
    /// # Errors
    /// Returns `BundleError::SourceUnavailable` if the file cannot be read.
    pub fn load(&self) -> Result<String, BundleError> {
        match &self.source {
            SourceText::Inline(text) => Ok(text.clone()),
            SourceText::File(path) => {
                std::fs::read_to_string(path).map_err(|e| BundleError::SourceUnavailable {
                    name: self.name.clone(),
                    reason: format!("{}: {e}", path.display()),
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use tokio_test::{assert_err, assert_ok};

    use super::*;

    #[test]
    fn test_inline_loads_verbatim() {
        let def = Definition::inline("f", "function f() {}\n");
        assert_eq!(def.name(), "f");
        assert_eq!(assert_ok!(def.load()), "function f() {}\n");
    }

    #[test]
    fn test_missing_file_unavailable() {
        let def = Definition::file("g", "/definitely/not/here/g.js");
        let err = assert_err!(def.load());
        assert!(matches!(err, BundleError::SourceUnavailable { ref name, .. } if name == "g"));
        assert!(err.to_string().contains("g.js"));
    }
}
