//! Pipeline plans: ordered stage groups plus finalizers

use super::registry::StageRegistry;
use crate::result::{GantryError, GantryResult};
use std::collections::HashSet;

/// One step of a plan
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StageGroup {
    /// A single stage
    Single(String),
    /// Stages started together; the plan advances once all have finished
    Parallel(Vec<String>),
}

impl StageGroup {
    /// Member stage names in declaration order
    #[must_use]
    pub fn names(&self) -> &[String] {
        match self {
            Self::Single(name) => std::slice::from_ref(name),
            Self::Parallel(names) => names,
        }
    }
}

/// Cleanup that must run once `trigger` has succeeded, even if a later
/// stage fails
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Finalizer {
    /// Stage whose success arms the finalizer
    pub trigger: String,
    /// Stage run on failure if it has not run already
    pub cleanup: String,
}

/// A named, ordered sequence of stage groups
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelinePlan {
    name: String,
    groups: Vec<StageGroup>,
    finalizers: Vec<Finalizer>,
}

impl PipelinePlan {
    /// Start an empty plan
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            groups: Vec::new(),
            finalizers: Vec::new(),
        }
    }

    /// Plan running exactly one stage
    #[must_use]
    pub fn single(stage: impl Into<String>) -> Self {
        let stage = stage.into();
        Self::new(stage.clone()).then(stage)
    }

    /// Append a sequential stage
    #[must_use]
    pub fn then(mut self, stage: impl Into<String>) -> Self {
        self.groups.push(StageGroup::Single(stage.into()));
        self
    }

    /// Append a parallel group
    #[must_use]
    pub fn parallel<I, S>(mut self, stages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.groups
            .push(StageGroup::Parallel(stages.into_iter().map(Into::into).collect()));
        self
    }

    /// Append every group and finalizer of another plan
    #[must_use]
    pub fn extend(mut self, other: &Self) -> Self {
        self.groups.extend(other.groups.iter().cloned());
        self.finalizers.extend(other.finalizers.iter().cloned());
        self
    }

    /// Guarantee `cleanup` runs if `trigger` succeeded and the run fails
    #[must_use]
    pub fn finally(mut self, trigger: impl Into<String>, cleanup: impl Into<String>) -> Self {
        self.finalizers.push(Finalizer {
            trigger: trigger.into(),
            cleanup: cleanup.into(),
        });
        self
    }

    /// Plan name
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Stage groups in execution order
    #[must_use]
    pub fn groups(&self) -> &[StageGroup] {
        &self.groups
    }

    /// Declared finalizers
    #[must_use]
    pub fn finalizers(&self) -> &[Finalizer] {
        &self.finalizers
    }

    /// Every scheduled stage name in execution order
    pub fn stage_names(&self) -> impl Iterator<Item = &str> {
        self.groups
            .iter()
            .flat_map(StageGroup::names)
            .map(String::as_str)
    }

    /// Check the plan against a registry before anything runs
    pub fn validate(&self, registry: &StageRegistry) -> GantryResult<()> {
        if self.groups.is_empty() {
            return Err(GantryError::invalid_plan(format!(
                "pipeline '{}' has no stages",
                self.name
            )));
        }

        let mut seen = HashSet::new();
        for group in &self.groups {
            if group.names().is_empty() {
                return Err(GantryError::invalid_plan(format!(
                    "pipeline '{}' has an empty parallel group",
                    self.name
                )));
            }
            for name in group.names() {
                let _ = registry.require(name)?;
                if !seen.insert(name.as_str()) {
                    return Err(GantryError::DuplicateStage { name: name.clone() });
                }
            }
        }

        for finalizer in &self.finalizers {
            let _ = registry.require(&finalizer.cleanup)?;
            if !seen.contains(finalizer.trigger.as_str()) {
                return Err(GantryError::invalid_plan(format!(
                    "finalizer trigger '{}' is not scheduled in pipeline '{}'",
                    finalizer.trigger, self.name
                )));
            }
        }
        Ok(())
    }
}
