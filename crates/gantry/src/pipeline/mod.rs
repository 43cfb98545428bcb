//! Stage sequencing
//!
//! A [`StageRegistry`] maps names to operations, a [`PipelinePlan`] orders
//! them into groups, and the [`Sequencer`] runs the plan to a single
//! [`PipelineReport`].

mod plan;
mod registry;
mod report;
mod sequencer;
mod stage;

pub use plan::{Finalizer, PipelinePlan, StageGroup};
pub use registry::StageRegistry;
pub use report::{PipelineReport, StageRecord, StageStatus};
pub use sequencer::Sequencer;
pub use stage::{Stage, StageFn, StageOperation};
