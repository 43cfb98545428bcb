//! Stage descriptors and the operation trait behind them

use crate::result::GantryResult;
use async_trait::async_trait;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

/// A unit of asynchronous pipeline work
#[async_trait]
pub trait StageOperation: Send + Sync {
    /// Run to completion
    async fn run(&self) -> GantryResult<()>;
}

/// Adapter turning an async closure into a [`StageOperation`]
pub struct StageFn<F>(F);

impl<F> StageFn<F> {
    /// Wrap a closure
    pub const fn new(f: F) -> Self {
        Self(f)
    }
}

#[async_trait]
impl<F, Fut> StageOperation for StageFn<F>
where
    F: Fn() -> Fut + Send + Sync,
    Fut: Future<Output = GantryResult<()>> + Send,
{
    async fn run(&self) -> GantryResult<()> {
        (self.0)().await
    }
}

/// A registered stage: a unique name bound to an operation
#[derive(Clone)]
pub struct Stage {
    name: String,
    description: String,
    operation: Arc<dyn StageOperation>,
}

impl Stage {
    /// Bind a name to an operation
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        operation: Arc<dyn StageOperation>,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            operation,
        }
    }

    /// Stage name
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// One-line description
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Shared handle to the operation
    #[must_use]
    pub fn operation(&self) -> Arc<dyn StageOperation> {
        Arc::clone(&self.operation)
    }
}

impl fmt::Debug for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Stage")
            .field("name", &self.name)
            .field("description", &self.description)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::result::GantryError;

    #[tokio::test]
    async fn test_stage_fn_runs_closure() {
        let op = StageFn::new(|| async { Ok(()) });
        op.run().await.unwrap();
    }

    #[tokio::test]
    async fn test_stage_fn_propagates_error() {
        let op = StageFn::new(|| async { Err(GantryError::NoData) });
        assert!(matches!(op.run().await, Err(GantryError::NoData)));
    }

    #[test]
    fn test_stage_debug_omits_operation() {
        let stage = Stage::new("lint", "run the linter", Arc::new(StageFn::new(|| async { Ok(()) })));
        let debug = format!("{stage:?}");
        assert!(debug.contains("lint"));
        assert!(debug.contains(".."));
    }
}
