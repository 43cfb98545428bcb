//! External tool invocation
//!
//! Commands come from the `tools` and `hostTasks` configuration sections.
//! Arguments may embed `{placeholder}` tokens naming configured paths; an
//! argument that is exactly `{specs}` expands to every spec file.

use crate::config::{PipelineConfig, ToolCommand};
use crate::result::{GantryError, GantryResult};
use std::path::Component;
use std::process::Stdio;
use std::sync::Arc;
use std::time::Instant;

/// Argument replaced by the list of spec files
pub const SPECS_PLACEHOLDER: &str = "{specs}";

/// Runs configured commands from the project root
#[derive(Debug, Clone)]
pub struct ToolRunner {
    config: Arc<PipelineConfig>,
}

impl ToolRunner {
    /// Create a runner for a configuration
    #[must_use]
    pub const fn new(config: Arc<PipelineConfig>) -> Self {
        Self { config }
    }

    /// Final argument list for a command
    pub fn expand_args(&self, command: &ToolCommand) -> GantryResult<Vec<String>> {
        let mut args = Vec::with_capacity(command.args.len());
        for arg in &command.args {
            if arg == SPECS_PLACEHOLDER {
                args.extend(self.spec_files()?);
            } else {
                args.push(substitute(arg, &self.config));
            }
        }
        Ok(args)
    }

    /// Spec files matching `specGlob` under the root, sorted, excluding
    /// anything inside `node_modules`
    pub fn spec_files(&self) -> GantryResult<Vec<String>> {
        let pattern = self.config.root.join(&self.config.spec_glob);
        let pattern = pattern.to_string_lossy();
        let entries = glob::glob(&pattern)
            .map_err(|e| GantryError::config(format!("invalid specGlob '{pattern}': {e}")))?;

        let mut files: Vec<String> = entries
            .filter_map(Result::ok)
            .filter(|path| {
                !path
                    .components()
                    .any(|c| c == Component::Normal("node_modules".as_ref()))
            })
            .map(|path| path.display().to_string())
            .collect();
        files.sort();
        Ok(files)
    }

    /// Run a command to completion with inherited stdout/stderr
    pub async fn run(&self, command: &ToolCommand) -> GantryResult<()> {
        if command.program.trim().is_empty() {
            return Err(GantryError::config("tool command has an empty program"));
        }
        let args = self.expand_args(command)?;
        tracing::debug!(program = %command.program, args = ?args, "running tool");

        let start = Instant::now();
        let status = tokio::process::Command::new(&command.program)
            .args(&args)
            .current_dir(&self.config.root)
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .status()
            .await
            .map_err(|e| GantryError::ToolFailed {
                tool: command.program.clone(),
                code: None,
                message: format!("failed to start: {e}"),
            })?;

        let elapsed_ms = start.elapsed().as_millis();
        if status.success() {
            tracing::debug!(program = %command.program, elapsed_ms, "tool finished");
            Ok(())
        } else {
            Err(GantryError::ToolFailed {
                tool: command.program.clone(),
                code: status.code(),
                message: format!("`{} {}`", command.program, args.join(" ")),
            })
        }
    }
}

/// Replace every known `{name}` token; unknown tokens are left as written
fn substitute(arg: &str, config: &PipelineConfig) -> String {
    let mut out = String::with_capacity(arg.len());
    let mut rest = arg;
    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        match after.find('}') {
            Some(close) => {
                let name = &after[..close];
                match config.placeholder(name) {
                    Some(path) => out.push_str(&path.display().to_string()),
                    None => {
                        out.push('{');
                        out.push_str(name);
                        out.push('}');
                    }
                }
                rest = &after[close + 1..];
            }
            None => {
                out.push_str(&rest[open..]);
                rest = "";
            }
        }
    }
    out.push_str(rest);
    out
}
