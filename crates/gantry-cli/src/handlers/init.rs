//! Init command handler

use crate::config::CliConfig;
use crate::error::{CliError, CliResult};
use crate::output::ProgressReporter;
use crate::InitArgs;
use gantry::PipelineConfig;
use std::path::Path;

/// Execute the init command
pub fn execute_init(config: &CliConfig, args: &InitArgs, reporter: &ProgressReporter) -> CliResult<()> {
    let path = config.config_path();
    write_default_config(&path, args.force)?;
    reporter.success(&format!("Created {}", path.display()));
    Ok(())
}

/// Default `gantry.yaml` content
pub fn default_config_yaml() -> CliResult<String> {
    Ok(format!(
        "# Gantry pipeline configuration\n{}",
        PipelineConfig::default().to_yaml()?
    ))
}

/// Write the default configuration, refusing to clobber unless `force`
pub fn write_default_config(path: &Path, force: bool) -> CliResult<()> {
    if path.exists() && !force {
        return Err(CliError::invalid_argument(format!(
            "{} already exists (use --force to overwrite)",
            path.display()
        )));
    }
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, default_config_yaml()?)?;
    Ok(())
}
