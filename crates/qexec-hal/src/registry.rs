//! Backend registry for managing available backends.
//!
//! The [`BackendRegistry`] is the central point for discovering and creating
//! backend instances by name.

use std::sync::Arc;

use rustc_hash::FxHashMap;
use tracing::debug;

use crate::backend::{Backend, BackendConfig, BackendFactory};
use crate::error::{HalError, HalResult};

/// Factory function type for registered backends.
type Factory = Box<dyn Fn(BackendConfig) -> HalResult<Arc<dyn Backend>> + Send + Sync>;

/// Central registry for execution backends.
pub struct BackendRegistry {
    /// Backend factories keyed by name.
    factories: FxHashMap<String, Factory>,
}

impl BackendRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self {
            factories: FxHashMap::default(),
        }
    }

    /// Register a backend type that can build itself from configuration.
    pub fn register<B>(&mut self, name: impl Into<String>)
    where
        B: BackendFactory + 'static,
    {
        let name = name.into();
        debug!("Registering backend: {}", name);
        self.factories.insert(
            name,
            Box::new(|config| {
                let backend = B::from_config(config)?;
                Ok(Arc::new(backend))
            }),
        );
    }

    /// Register a backend factory with a custom constructor.
    pub fn register_factory(
        &mut self,
        name: impl Into<String>,
        factory: impl Fn(BackendConfig) -> HalResult<Arc<dyn Backend>> + Send + Sync + 'static,
    ) {
        let name = name.into();
        debug!("Registering factory backend: {}", name);
        self.factories.insert(name, Box::new(factory));
    }

    /// Create a backend by name.
    pub fn create(&self, name: &str, config: BackendConfig) -> HalResult<Arc<dyn Backend>> {
        match self.factories.get(name) {
            Some(factory) => factory(config),
            None => Err(HalError::BackendUnavailable(format!(
                "No backend registered with name '{name}'"
            ))),
        }
    }

    /// List all available backend names.
    pub fn available_backends(&self) -> Vec<String> {
        let mut names: Vec<_> = self.factories.keys().cloned().collect();
        names.sort();
        names
    }

    /// Check if a backend is available by name.
    pub fn has_backend(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }
}

impl Default for BackendRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for BackendRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackendRegistry")
            .field("backends", &self.available_backends())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_registry() {
        let registry = BackendRegistry::new();
        assert!(registry.available_backends().is_empty());
        assert!(!registry.has_backend("simulator"));
    }

    #[test]
    fn test_register_factory() {
        let mut registry = BackendRegistry::new();
        registry.register_factory("test", |_config| {
            Err(HalError::BackendUnavailable("test only".into()))
        });

        assert!(registry.has_backend("test"));
        assert_eq!(registry.available_backends(), vec!["test"]);
        assert!(matches!(
            registry.create("test", BackendConfig::new("test")),
            Err(HalError::BackendUnavailable(_))
        ));
    }

    #[test]
    fn test_create_unknown_backend() {
        let registry = BackendRegistry::new();
        let result = registry.create("nonexistent", BackendConfig::new("nonexistent"));
        assert!(matches!(result, Err(HalError::BackendUnavailable(_))));
    }

    #[test]
    fn test_available_backends_sorted() {
        let mut registry = BackendRegistry::new();
        registry.register_factory("zebra", |_| Err(HalError::BackendUnavailable("test".into())));
        registry.register_factory("alpha", |_| Err(HalError::BackendUnavailable("test".into())));

        let backends = registry.available_backends();
        assert_eq!(backends, vec!["alpha", "zebra"]);
    }
}
