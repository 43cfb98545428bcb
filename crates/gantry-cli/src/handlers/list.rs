//! List command handler

use crate::config::CliConfig;
use crate::error::CliResult;
use gantry::{standard_registry, StageRegistry, PIPELINES};
use std::fmt::Write;
use std::sync::Arc;

/// Execute the list command
pub fn execute_list(config: &CliConfig) -> CliResult<()> {
    let pipeline = Arc::new(config.load_pipeline()?);
    let registry = standard_registry(&pipeline)?;
    print!("{}", render_listing(&registry));
    Ok(())
}

/// Stages and pipelines as aligned two-column text
#[must_use]
pub fn render_listing(registry: &StageRegistry) -> String {
    let width = registry
        .stages()
        .map(|s| s.name().len())
        .chain(PIPELINES.iter().map(|(name, _)| name.len()))
        .max()
        .unwrap_or(0);

    let mut out = String::from("Stages:\n");
    for stage in registry.stages() {
        let _ = writeln!(out, "  {:<width$}  {}", stage.name(), stage.description());
    }
    out.push_str("\nPipelines:\n");
    for (name, description) in PIPELINES {
        let _ = writeln!(out, "  {name:<width$}  {description}");
    }
    out
}
