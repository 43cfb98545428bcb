//! Pipeline configuration
//!
//! Loaded from `gantry.yaml`. Every relative path is resolved against
//! [`PipelineConfig::root`]; nothing reads the process working directory.

use crate::result::{GantryError, GantryResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Default configuration file name
pub const CONFIG_FILE_NAME: &str = "gantry.yaml";

/// Directory under the coverage root holding remap intermediates
const REMAP_DIR: &str = "istanbul-remap";

/// Report output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReportFormat {
    /// Human-readable per-file table
    Text,
    /// LCOV tracefile
    Lcov,
    /// Machine-readable totals per file
    JsonSummary,
}

impl ReportFormat {
    /// Format name as used in configuration
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Lcov => "lcov",
            Self::JsonSummary => "json-summary",
        }
    }
}

/// How the aggregator combines two documents that mention the same path
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MergePolicy {
    /// The later document replaces the earlier record
    #[default]
    Replace,
    /// Hit counts for identical ids are added together
    Sum,
}

/// An external command line
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolCommand {
    /// Program to execute (looked up on `PATH`)
    pub program: String,
    /// Arguments, may contain `{placeholder}` tokens
    #[serde(default)]
    pub args: Vec<String>,
}

impl ToolCommand {
    /// Create a tool command
    #[must_use]
    pub fn new(program: impl Into<String>, args: &[&str]) -> Self {
        Self {
            program: program.into(),
            args: args.iter().map(|a| (*a).to_string()).collect(),
        }
    }
}

/// Coverage pruning options
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PruneConfig {
    /// Substrings whose presence in a key drops the entry
    pub exclude: Vec<String>,
    /// Literal prefix stripped from surviving paths
    pub strip_prefix: String,
}

impl Default for PruneConfig {
    fn default() -> Self {
        Self {
            exclude: vec![
                "node_modules".to_string(),
                ".spec.ts".to_string(),
                ".d.ts".to_string(),
                "testUtils.ts".to_string(),
            ],
            strip_prefix: "/source/".to_string(),
        }
    }
}

/// Coverage report options
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ReportConfig {
    /// Formats emitted on finalize
    pub formats: Vec<ReportFormat>,
    /// Merge policy for repeated paths
    pub merge: MergePolicy,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            formats: vec![ReportFormat::Text, ReportFormat::Lcov],
            merge: MergePolicy::Replace,
        }
    }
}

/// Vendor file swapped for a stub during instrumented test runs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct VendorConfig {
    /// File the application loads
    pub live: PathBuf,
    /// Where the original is kept while patched
    pub backup: PathBuf,
    /// Replacement content
    pub stub: PathBuf,
}

impl Default for VendorConfig {
    fn default() -> Self {
        Self {
            live: PathBuf::from("node_modules/ionic-angular/decorators/app.js"),
            backup: PathBuf::from("node_modules/ionic-angular/decorators/app.backup"),
            stub: PathBuf::from("test/app.stub.js"),
        }
    }
}

/// Watch options
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WatchConfig {
    /// File extensions that trigger a rebuild
    pub extensions: Vec<String>,
    /// Quiet period before a burst of changes triggers one rebuild
    pub debounce_ms: u64,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            extensions: vec!["ts".to_string()],
            debounce_ms: 300,
        }
    }
}

/// External tools invoked by the pipeline stages
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct ToolsConfig {
    /// Linter over the app sources
    pub lint: ToolCommand,
    /// Compiler for app and test sources
    pub build: ToolCommand,
    /// Compiler for end-to-end sources
    pub build_e2e: ToolCommand,
    /// Spec bundler
    pub bundle: ToolCommand,
    /// Headless single-run test runner
    pub run_tests: ToolCommand,
    /// Test runner left open in a real browser
    pub run_tests_interactive: ToolCommand,
    /// Source-map remapper for raw coverage
    pub remap_coverage: ToolCommand,
    /// The host build's own build task
    pub host_build: ToolCommand,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            lint: ToolCommand::new("tslint", &["--format", "stylish", "{appDir}/**/*.ts"]),
            build: ToolCommand::new("tsc", &["-p", "tsconfig.json", "--outDir", "{testDest}"]),
            build_e2e: ToolCommand::new(
                "tsc",
                &["-p", "tsconfig.e2e.json", "--outDir", "{testDest}"],
            ),
            bundle: ToolCommand::new(
                "browserify",
                &[
                    "{specs}",
                    "{typingsDir}/main.d.ts",
                    "-p",
                    "tsify",
                    "--debug",
                    "-o",
                    "{testDest}/test.bundle.js",
                ],
            ),
            run_tests: ToolCommand::new(
                "karma",
                &["start", "{testDir}/karma.config.js", "--single-run"],
            ),
            run_tests_interactive: ToolCommand::new(
                "karma",
                &[
                    "start",
                    "{testDir}/karma.config.js",
                    "--no-single-run",
                    "--browsers",
                    "Chrome",
                ],
            ),
            remap_coverage: ToolCommand::new(
                "remap-istanbul",
                &["-i", "{coverageFinal}", "-o", "{coverageRemapped}", "-t", "json"],
            ),
            host_build: ToolCommand::new("gulp", &["build"]),
        }
    }
}

fn default_host_tasks() -> BTreeMap<String, ToolCommand> {
    ["sass", "fonts", "html"]
        .iter()
        .map(|task| ((*task).to_string(), ToolCommand::new("gulp", &[task])))
        .collect()
}

/// Configuration threaded through every pipeline component
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PipelineConfig {
    /// Project root; relative paths are joined onto it
    #[serde(skip)]
    pub root: PathBuf,
    /// Source root for app code
    pub app_dir: PathBuf,
    /// Source root for tests
    pub test_dir: PathBuf,
    /// Build output for test artifacts
    pub test_dest: PathBuf,
    /// Root for coverage intermediates and reports
    pub coverage_dir: PathBuf,
    /// Root for generated type declarations
    pub typings_dir: PathBuf,
    /// Glob (relative to root) locating spec entry points for bundling
    pub spec_glob: String,
    /// Coverage pruning
    pub prune: PruneConfig,
    /// Coverage reporting
    pub reports: ReportConfig,
    /// Vendor patch swap
    pub vendor: VendorConfig,
    /// Watch mode
    pub watch: WatchConfig,
    /// External tools
    pub tools: ToolsConfig,
    /// Host build hooks, registered as `host:<name>` stages
    pub host_tasks: BTreeMap<String, ToolCommand>,
    /// Keep console reports off stdout; set at runtime, never read from YAML
    #[serde(skip)]
    pub quiet: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            app_dir: PathBuf::from("app"),
            test_dir: PathBuf::from("test"),
            test_dest: PathBuf::from("www/build/test"),
            coverage_dir: PathBuf::from("coverage"),
            typings_dir: PathBuf::from("typings"),
            spec_glob: "**/*.spec.ts".to_string(),
            prune: PruneConfig::default(),
            reports: ReportConfig::default(),
            vendor: VendorConfig::default(),
            watch: WatchConfig::default(),
            tools: ToolsConfig::default(),
            host_tasks: default_host_tasks(),
            quiet: false,
        }
    }
}

impl PipelineConfig {
    /// Create a default configuration rooted at `root`
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self::default().with_root(root)
    }

    /// Set the project root
    #[must_use]
    pub fn with_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.root = root.into();
        self
    }

    /// Suppress console reports
    #[must_use]
    pub const fn with_quiet(mut self, quiet: bool) -> Self {
        self.quiet = quiet;
        self
    }

    /// Parse configuration from YAML text
    pub fn from_yaml(yaml: &str, root: impl Into<PathBuf>) -> GantryResult<Self> {
        let config: Self = serde_yaml_ng::from_str(yaml)?;
        let config = config.with_root(root);
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a file; its parent directory becomes the root
    pub fn load(path: &Path) -> GantryResult<Self> {
        let yaml = std::fs::read_to_string(path).map_err(|e| {
            GantryError::config(format!("Failed to read {}: {e}", path.display()))
        })?;
        let root = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map_or_else(|| PathBuf::from("."), Path::to_path_buf);
        Self::from_yaml(&yaml, root)
    }

    /// Load `gantry.yaml` from `root` if present, otherwise use defaults
    pub fn discover(root: &Path) -> GantryResult<Self> {
        let candidate = root.join(CONFIG_FILE_NAME);
        if candidate.is_file() {
            Ok(Self::load(&candidate)?.with_root(root))
        } else {
            Ok(Self::new(root))
        }
    }

    /// Serialize to YAML
    pub fn to_yaml(&self) -> GantryResult<String> {
        Ok(serde_yaml_ng::to_string(self)?)
    }

    /// Check invariants the stages rely on
    pub fn validate(&self) -> GantryResult<()> {
        if self.prune.exclude.iter().any(String::is_empty) {
            return Err(GantryError::config(
                "prune.exclude entries must be non-empty (an empty substring matches every key)",
            ));
        }
        if self.vendor.live == self.vendor.backup {
            return Err(GantryError::config(
                "vendor.live and vendor.backup must be different files",
            ));
        }
        if self.reports.formats.is_empty() {
            return Err(GantryError::config("reports.formats must name at least one format"));
        }
        for name in self.host_tasks.keys() {
            if name.is_empty() || name.contains(char::is_whitespace) {
                return Err(GantryError::config(format!("invalid host task name '{name}'")));
            }
        }
        Ok(())
    }

    /// Resolve a configured path against the root
    #[must_use]
    pub fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        }
    }

    /// Absolute-ish app source root
    #[must_use]
    pub fn app_path(&self) -> PathBuf {
        self.resolve(&self.app_dir)
    }

    /// Absolute-ish test build output
    #[must_use]
    pub fn test_dest_path(&self) -> PathBuf {
        self.resolve(&self.test_dest)
    }

    /// Raw coverage written by the test runner
    #[must_use]
    pub fn coverage_final(&self) -> PathBuf {
        self.remap_dir().join("coverage-final.json")
    }

    /// Coverage after source-map remapping
    #[must_use]
    pub fn coverage_remapped(&self) -> PathBuf {
        self.remap_dir().join("coverage-remapped.json")
    }

    /// Coverage after pruning
    #[must_use]
    pub fn coverage_pruned(&self) -> PathBuf {
        self.remap_dir().join("coverage-pruned.json")
    }

    /// Where a report format is written, `None` for console-only formats
    #[must_use]
    pub fn report_path(&self, format: ReportFormat) -> Option<PathBuf> {
        let dir = self.resolve(&self.coverage_dir);
        match format {
            ReportFormat::Text => None,
            ReportFormat::Lcov => Some(dir.join("lcov.info")),
            ReportFormat::JsonSummary => Some(dir.join("coverage-summary.json")),
        }
    }

    fn remap_dir(&self) -> PathBuf {
        self.resolve(&self.coverage_dir).join(REMAP_DIR)
    }

    /// Value substituted for a `{placeholder}` token, if known
    #[must_use]
    pub fn placeholder(&self, name: &str) -> Option<PathBuf> {
        let path = match name {
            "root" => self.root.clone(),
            "appDir" => self.resolve(&self.app_dir),
            "testDir" => self.resolve(&self.test_dir),
            "testDest" => self.resolve(&self.test_dest),
            "coverageDir" => self.resolve(&self.coverage_dir),
            "typingsDir" => self.resolve(&self.typings_dir),
            "coverageFinal" => self.coverage_final(),
            "coverageRemapped" => self.coverage_remapped(),
            _ => return None,
        };
        Some(path)
    }
}
