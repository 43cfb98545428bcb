//! CLI command definitions using clap

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Gantry: run, watch and report mobile-web test pipelines
#[derive(Parser, Debug)]
#[command(name = "gantry")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Configuration file (default: <root>/gantry.yaml if present)
    #[arg(short, long, global = true, env = "GANTRY_CONFIG")]
    pub config: Option<PathBuf>,

    /// Project root (default: the config file's directory, else ".")
    #[arg(long, global = true)]
    pub root: Option<PathBuf>,

    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Quiet mode (suppress non-error output)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Color output (auto, always, never)
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorArg,

    /// Subcommand to run
    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Compile app and test sources into the test build output
    Build,

    /// Remove the test build output
    Clean,

    /// Lint the app sources
    Lint,

    /// Bundle the spec files
    Bundle,

    /// Run the tests once in a headless browser
    RunTests,

    /// Run the tests in a browser that stays open
    RunTestsInteractive,

    /// Watch app sources and rebuild on change
    Watch,

    /// Remap raw coverage through source maps
    RemapCoverage,

    /// Drop excluded files from remapped coverage
    PruneCoverage,

    /// Write coverage reports from pruned coverage
    ReportCoverage,

    /// Swap the vendor file for its stub
    PatchVendor,

    /// Put the original vendor file back
    RestoreVendor,

    /// Clean, run host hooks, build, then run the tests
    Test,

    /// Instrumented test run followed by coverage reports
    TestAndReport,

    /// Build once, then watch and rebuild on change
    WatchCycle,

    /// Run any stage or pipeline by name (e.g. host:sass, build-e2e)
    Run(RunArgs),

    /// List stages and pipelines
    List,

    /// Write a default gantry.yaml
    Init(InitArgs),

    /// Print the effective configuration
    Config,
}

impl Commands {
    /// Stage or pipeline a command runs, `None` for housekeeping commands
    #[must_use]
    pub fn target(&self) -> Option<&str> {
        let name = match self {
            Self::Build => "build",
            Self::Clean => "clean",
            Self::Lint => "lint",
            Self::Bundle => "bundle",
            Self::RunTests => "run-tests",
            Self::RunTestsInteractive => "run-tests-interactive",
            Self::Watch => "watch",
            Self::RemapCoverage => "remap-coverage",
            Self::PruneCoverage => "prune-coverage",
            Self::ReportCoverage => "report-coverage",
            Self::PatchVendor => "patch-vendor",
            Self::RestoreVendor => "restore-vendor",
            Self::Test => "test",
            Self::TestAndReport => "test-and-report",
            Self::WatchCycle => "watch-cycle",
            Self::Run(args) => args.target.as_str(),
            Self::List | Self::Init(_) | Self::Config => return None,
        };
        Some(name)
    }
}

/// Arguments for the run command
#[derive(Parser, Debug, Clone, PartialEq, Eq)]
pub struct RunArgs {
    /// Stage or pipeline name
    pub target: String,
}

/// Arguments for the init command
#[derive(Parser, Debug, Clone, PartialEq, Eq)]
pub struct InitArgs {
    /// Overwrite an existing gantry.yaml
    #[arg(short, long)]
    pub force: bool,
}

/// Color output choice
#[derive(ValueEnum, Clone, Debug, Default)]
pub enum ColorArg {
    /// Automatic color detection
    #[default]
    Auto,
    /// Always use colors
    Always,
    /// Never use colors
    Never,
}

impl From<ColorArg> for crate::config::ColorChoice {
    fn from(arg: ColorArg) -> Self {
        match arg {
            ColorArg::Auto => Self::Auto,
            ColorArg::Always => Self::Always,
            ColorArg::Never => Self::Never,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    mod cli_tests {
        use super::*;

        #[test]
        fn test_stage_commands_map_to_targets() {
            let cases = [
                ("build", "build"),
                ("clean", "clean"),
                ("lint", "lint"),
                ("bundle", "bundle"),
                ("run-tests", "run-tests"),
                ("run-tests-interactive", "run-tests-interactive"),
                ("watch", "watch"),
                ("remap-coverage", "remap-coverage"),
                ("prune-coverage", "prune-coverage"),
                ("report-coverage", "report-coverage"),
                ("patch-vendor", "patch-vendor"),
                ("restore-vendor", "restore-vendor"),
                ("test", "test"),
                ("test-and-report", "test-and-report"),
                ("watch-cycle", "watch-cycle"),
            ];
            for (arg, target) in cases {
                let cli = Cli::parse_from(["gantry", arg]);
                assert_eq!(cli.command.target(), Some(target), "command {arg}");
            }
        }

        #[test]
        fn test_parse_run() {
            let cli = Cli::parse_from(["gantry", "run", "host:sass"]);
            assert_eq!(cli.command.target(), Some("host:sass"));
        }

        #[test]
        fn test_housekeeping_has_no_target() {
            assert_eq!(Cli::parse_from(["gantry", "list"]).command.target(), None);
            assert_eq!(Cli::parse_from(["gantry", "config"]).command.target(), None);
        }

        #[test]
        fn test_parse_init_force() {
            let cli = Cli::parse_from(["gantry", "init", "--force"]);
            assert_eq!(cli.command, Commands::Init(InitArgs { force: true }));
        }

        #[test]
        fn test_global_flags() {
            let cli = Cli::parse_from([
                "gantry", "test", "--root", "/proj", "--config", "ci.yaml", "-vv",
            ]);
            assert_eq!(cli.root, Some(PathBuf::from("/proj")));
            assert_eq!(cli.config, Some(PathBuf::from("ci.yaml")));
            assert_eq!(cli.verbose, 2);
        }

        #[test]
        fn test_parse_quiet_and_color() {
            let cli = Cli::parse_from(["gantry", "-q", "--color", "never", "lint"]);
            assert!(cli.quiet);
            assert!(matches!(cli.color, ColorArg::Never));
        }

        #[test]
        fn test_unknown_command_rejected() {
            assert!(Cli::try_parse_from(["gantry", "deploy"]).is_err());
        }
    }
}
