//! Gantry CLI: run, watch and report mobile-web test pipelines
//!
//! ## Usage
//!
//! ```bash
//! gantry test                  # clean, host hooks, build, run tests
//! gantry test-and-report       # instrumented run plus coverage reports
//! gantry run host:sass         # any stage by name
//! gantry list                  # stages and pipelines
//! ```

use clap::Parser;
use gantry_cli::{run_command, Cli, CliConfig, CliResult, ColorChoice, Verbosity};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> CliResult<()> {
    let cli = Cli::parse();
    let config = build_config(&cli);
    init_tracing(&config);

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    runtime.block_on(run_command(&cli.command, &config))
}

fn build_config(cli: &Cli) -> CliConfig {
    CliConfig::new()
        .with_verbosity(Verbosity::from_flags(cli.verbose, cli.quiet))
        .with_color(ColorChoice::from(cli.color.clone()))
        .with_config_file(cli.config.clone())
        .with_root(cli.root.clone())
}

/// `RUST_LOG` overrides the level chosen by `-v`/`-q`; `-v` also shows targets
fn init_tracing(config: &CliConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.verbosity.log_directive()));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(config.color.should_color())
        .with_target(config.verbosity.is_verbose())
        .try_init();
}
