//! Stage registry
//!
//! Built once per run and handed to the [`Sequencer`](super::Sequencer);
//! names are checked when a stage is registered, not when it runs.

use super::stage::{Stage, StageFn, StageOperation};
use crate::result::{GantryError, GantryResult};
use std::collections::BTreeMap;
use std::future::Future;
use std::sync::Arc;

/// Name-to-operation lookup for one pipeline run
#[derive(Debug, Clone, Default)]
pub struct StageRegistry {
    stages: BTreeMap<String, Stage>,
}

impl StageRegistry {
    /// Create an empty registry
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an operation under a unique name
    pub fn register(
        &mut self,
        name: impl Into<String>,
        description: impl Into<String>,
        operation: Arc<dyn StageOperation>,
    ) -> GantryResult<()> {
        let stage = Stage::new(name, description, operation);
        let name = stage.name().to_string();
        if name.is_empty() || name.contains(char::is_whitespace) {
            return Err(GantryError::invalid_plan(format!(
                "stage name '{name}' must be non-empty and contain no whitespace"
            )));
        }
        if self.stages.contains_key(&name) {
            return Err(GantryError::DuplicateStage { name });
        }
        let _ = self.stages.insert(name, stage);
        Ok(())
    }

    /// Register an async closure
    pub fn register_fn<F, Fut>(
        &mut self,
        name: impl Into<String>,
        description: impl Into<String>,
        f: F,
    ) -> GantryResult<()>
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = GantryResult<()>> + Send + 'static,
    {
        self.register(name, description, Arc::new(StageFn::new(f)))
    }

    /// Look up a stage
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Stage> {
        self.stages.get(name)
    }

    /// Look up a stage, failing with `UnknownStage`
    pub fn require(&self, name: &str) -> GantryResult<&Stage> {
        self.get(name).ok_or_else(|| GantryError::UnknownStage {
            name: name.to_string(),
        })
    }

    /// Whether `name` is registered
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.stages.contains_key(name)
    }

    /// Registered stages, sorted by name
    pub fn stages(&self) -> impl Iterator<Item = &Stage> {
        self.stages.values()
    }

    /// Number of registered stages
    #[must_use]
    pub fn len(&self) -> usize {
        self.stages.len()
    }

    /// Whether nothing is registered
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn ok_registry(names: &[&str]) -> StageRegistry {
        let mut registry = StageRegistry::new();
        for name in names {
            registry
                .register_fn(*name, "noop", || async { Ok(()) })
                .unwrap();
        }
        registry
    }

    #[test]
    fn test_register_and_lookup() {
        let registry = ok_registry(&["clean", "build"]);
        assert_eq!(registry.len(), 2);
        assert!(registry.contains("clean"));
        assert_eq!(registry.require("build").unwrap().name(), "build");
    }

    #[test]
    fn test_duplicate_rejected_at_registration() {
        let mut registry = ok_registry(&["clean"]);
        let err = registry
            .register_fn("clean", "again", || async { Ok(()) })
            .unwrap_err();
        assert!(matches!(err, GantryError::DuplicateStage { ref name } if name == "clean"));
    }

    #[test]
    fn test_invalid_names_rejected() {
        let mut registry = StageRegistry::new();
        assert!(registry.register_fn("", "empty", || async { Ok(()) }).is_err());
        assert!(registry.register_fn("run tests", "space", || async { Ok(()) }).is_err());
        assert!(registry.is_empty());
    }

    #[test]
    fn test_unknown_stage() {
        let registry = ok_registry(&["clean"]);
        let err = registry.require("deploy").unwrap_err();
        assert!(matches!(err, GantryError::UnknownStage { .. }));
    }

    #[test]
    fn test_stages_sorted() {
        let registry = ok_registry(&["lint", "bundle", "clean"]);
        let names: Vec<_> = registry.stages().map(Stage::name).collect();
        assert_eq!(names, vec!["bundle", "clean", "lint"]);
    }
}
