//! Registry of helper definitions.

use std::sync::{Arc, PoisonError, RwLock};

use crate::Definition;

/// Ordered, append-only list of helpers included in every bundle.
///
/// Clones share the same list. Dispatchers take a snapshot when they are
/// built; helpers registered afterwards only reach dispatchers built later.
#[derive(Debug, Clone, Default)]
pub struct HelperRegistry {
    helpers: Arc<RwLock<Vec<Definition>>>,
}

impl HelperRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a helper definition.
    pub fn register(&self, definition: Definition) -> &Self {
        tracing::debug!(name = definition.name(), "Registered helper");
        self.helpers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(definition);
        self
    }

    /// Copy of the registered helpers, in registration order.
    #[must_use]
    pub fn snapshot(&self) -> Vec<Definition> {
        self.helpers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.helpers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registration_order_kept() {
        let registry = HelperRegistry::new();
        registry
            .register(Definition::inline("a", "function a() {}"))
            .register(Definition::inline("b", "function b() {}"));

        let names: Vec<_> = registry
            .snapshot()
            .iter()
            .map(|d| d.name().to_string())
            .collect();
        assert_eq!(names, ["a", "b"]);
    }

    #[test]
    fn test_clones_share_list() {
        let registry = HelperRegistry::new();
        let other = registry.clone();
        other.register(Definition::inline("a", "function a() {}"));
        assert_eq!(registry.len(), 1);
        assert!(!registry.is_empty());
    }

    #[test]
    fn test_snapshot_is_detached() {
        let registry = HelperRegistry::new();
        let before = registry.snapshot();
        registry.register(Definition::inline("a", "function a() {}"));
        assert!(before.is_empty());
    }
}
