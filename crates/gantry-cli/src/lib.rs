//! Gantry CLI Library
//!
//! Command-line surface for the Gantry pipeline sequencer: one subcommand
//! per stage, the composite pipelines, and `list`/`init`/`config`.

#![warn(missing_docs)]

mod commands;
mod config;
mod error;
pub mod handlers;
mod output;

pub use commands::{Cli, ColorArg, Commands, InitArgs, RunArgs};
pub use config::{CliConfig, ColorChoice, Verbosity};
pub use error::{CliError, CliResult};
pub use output::{format_duration, ProgressReporter};

/// Dispatch a parsed command
pub async fn run_command(command: &Commands, config: &CliConfig) -> CliResult<()> {
    let mut reporter = ProgressReporter::new(config.color.should_color(), config.verbosity.is_quiet());
    match command {
        Commands::List => handlers::execute_list(config),
        Commands::Init(args) => handlers::execute_init(config, args, &reporter),
        Commands::Config => handlers::execute_config(config),
        other => match other.target() {
            Some(target) => handlers::execute_pipeline(config, target, &mut reporter).await,
            None => Err(CliError::invalid_argument("command has no stage to run")),
        },
    }
}
