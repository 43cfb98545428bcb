//! Smoke tests for the gantry CLI
//!
//! These drive the real binary against temporary projects. Stages that shell
//! out to external tools are not exercised here.

#![allow(deprecated)] // Allow deprecated Command::cargo_bin until assert_cmd is updated
#![allow(clippy::expect_used, clippy::unwrap_used)]

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

/// Get a command for the gantry binary, rooted at `root`
fn gantry(root: &Path) -> Command {
    let mut cmd = Command::cargo_bin("gantry").expect("gantry binary should exist");
    cmd.env_remove("GANTRY_CONFIG")
        .env_remove("RUST_LOG")
        .arg("--root")
        .arg(root)
        .arg("--color")
        .arg("never");
    cmd
}

fn remap_dir(root: &Path) -> std::path::PathBuf {
    root.join("coverage/istanbul-remap")
}

fn write_remapped(root: &Path) {
    let dir = remap_dir(root);
    fs::create_dir_all(&dir).unwrap();
    fs::write(
        dir.join("coverage-remapped.json"),
        r#"{
            "/source/app/app.component.ts": {
                "path": "/source/app/app.component.ts",
                "s": {"1": 1, "2": 0},
                "statementMap": {
                    "1": {"start": {"line": 1, "column": 0}, "end": {"line": 1, "column": 10}},
                    "2": {"start": {"line": 2, "column": 0}, "end": {"line": 2, "column": 10}}
                },
                "f": {}, "fnMap": {}, "b": {}, "branchMap": {}
            },
            "/source/app/app.component.spec.ts": {
                "path": "/source/app/app.component.spec.ts",
                "s": {"1": 3},
                "statementMap": {
                    "1": {"start": {"line": 1, "column": 0}, "end": {"line": 1, "column": 10}}
                },
                "f": {}, "fnMap": {}, "b": {}, "branchMap": {}
            },
            "/source/node_modules/lib/index.js": {
                "path": "/source/node_modules/lib/index.js",
                "s": {"1": 1},
                "statementMap": {
                    "1": {"start": {"line": 1, "column": 0}, "end": {"line": 1, "column": 10}}
                },
                "f": {}, "fnMap": {}, "b": {}, "branchMap": {}
            }
        }"#,
    )
    .unwrap();
}

// ============================================================================
// Basic CLI Tests
// ============================================================================

#[test]
fn test_version_flag() {
    let temp = TempDir::new().unwrap();
    gantry(temp.path())
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("gantry"));
}

#[test]
fn test_help_lists_commands() {
    let temp = TempDir::new().unwrap();
    gantry(temp.path())
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("test-and-report"))
        .stdout(predicate::str::contains("patch-vendor"))
        .stdout(predicate::str::contains("prune-coverage"));
}

#[test]
fn test_no_args_fails() {
    let temp = TempDir::new().unwrap();
    gantry(temp.path()).assert().failure();
}

#[test]
fn test_unknown_subcommand_fails() {
    let temp = TempDir::new().unwrap();
    gantry(temp.path()).arg("deploy").assert().failure();
}

// ============================================================================
// Housekeeping Commands
// ============================================================================

#[test]
fn test_list_shows_stages_and_pipelines() {
    let temp = TempDir::new().unwrap();
    gantry(temp.path())
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("Stages:"))
        .stdout(predicate::str::contains("host:sass"))
        .stdout(predicate::str::contains("restore-vendor"))
        .stdout(predicate::str::contains("Pipelines:"))
        .stdout(predicate::str::contains("watch-cycle"));
}

#[test]
fn test_init_writes_config() {
    let temp = TempDir::new().unwrap();
    gantry(temp.path()).arg("init").assert().success();

    let written = fs::read_to_string(temp.path().join("gantry.yaml")).unwrap();
    assert!(written.contains("appDir: app"));
}

#[test]
fn test_init_refuses_existing_without_force() {
    let temp = TempDir::new().unwrap();
    fs::write(temp.path().join("gantry.yaml"), "appDir: src\n").unwrap();

    gantry(temp.path())
        .arg("init")
        .assert()
        .failure()
        .stderr(predicate::str::contains("--force"));
    gantry(temp.path()).args(["init", "--force"]).assert().success();

    let written = fs::read_to_string(temp.path().join("gantry.yaml")).unwrap();
    assert!(written.contains("appDir: app"));
}

#[test]
fn test_config_prints_effective_yaml() {
    let temp = TempDir::new().unwrap();
    fs::write(temp.path().join("gantry.yaml"), "appDir: src\n").unwrap();

    gantry(temp.path())
        .arg("config")
        .assert()
        .success()
        .stdout(predicate::str::contains("appDir: src"))
        .stdout(predicate::str::contains("testDest: www/build/test"));
}

#[test]
fn test_invalid_config_fails() {
    let temp = TempDir::new().unwrap();
    fs::write(temp.path().join("gantry.yaml"), "prune: [not, a, map]\n").unwrap();

    gantry(temp.path())
        .arg("config")
        .assert()
        .failure()
        .stderr(predicate::str::starts_with("Error:"));
}

// ============================================================================
// Stages
// ============================================================================

#[test]
fn test_clean_removes_test_output() {
    let temp = TempDir::new().unwrap();
    let dest = temp.path().join("www/build/test");
    fs::create_dir_all(&dest).unwrap();
    fs::write(dest.join("test.bundle.js"), "//").unwrap();

    gantry(temp.path()).arg("clean").assert().success();
    assert!(!dest.exists());
}

#[test]
fn test_prune_coverage_drops_excluded_files() {
    let temp = TempDir::new().unwrap();
    write_remapped(temp.path());

    gantry(temp.path()).arg("prune-coverage").assert().success();

    let pruned = fs::read_to_string(remap_dir(temp.path()).join("coverage-pruned.json")).unwrap();
    let pruned: serde_json::Value = serde_json::from_str(&pruned).unwrap();
    let keys: Vec<&String> = pruned.as_object().unwrap().keys().collect();
    assert_eq!(keys, ["app/app.component.ts"]);
    assert_eq!(pruned["app/app.component.ts"]["path"], "app/app.component.ts");
}

#[test]
fn test_prune_then_report_writes_lcov() {
    let temp = TempDir::new().unwrap();
    write_remapped(temp.path());

    gantry(temp.path()).arg("prune-coverage").assert().success();
    gantry(temp.path())
        .arg("report-coverage")
        .assert()
        .success()
        .stdout(predicate::str::contains("All files"))
        .stdout(predicate::str::contains("app.component.ts"));

    let lcov = fs::read_to_string(temp.path().join("coverage/lcov.info")).unwrap();
    assert!(lcov.contains("SF:app/app.component.ts"));
    assert!(lcov.contains("LF:2"));
    assert!(lcov.contains("LH:1"));
}

#[test]
fn test_quiet_report_keeps_stdout_empty() {
    let temp = TempDir::new().unwrap();
    write_remapped(temp.path());

    gantry(temp.path()).arg("prune-coverage").assert().success();
    gantry(temp.path())
        .args(["-q", "report-coverage"])
        .assert()
        .success()
        .stdout(predicate::str::is_empty());

    let lcov = fs::read_to_string(temp.path().join("coverage/lcov.info")).unwrap();
    assert!(lcov.contains("SF:app/app.component.ts"));
}

#[test]
fn test_stage_lines_follow_pipeline_header() {
    let temp = TempDir::new().unwrap();
    gantry(temp.path())
        .arg("clean")
        .assert()
        .success()
        .stderr(predicate::str::contains("=== clean ==="))
        .stderr(predicate::str::contains("PASS clean"));
}

#[test]
fn test_prune_without_input_names_stage() {
    let temp = TempDir::new().unwrap();
    gantry(temp.path())
        .arg("prune-coverage")
        .assert()
        .failure()
        .stderr(predicate::str::contains("prune-coverage"));
}

#[test]
fn test_vendor_patch_and_restore() {
    let temp = TempDir::new().unwrap();
    let live = temp.path().join("node_modules/ionic-angular/decorators/app.js");
    fs::create_dir_all(live.parent().unwrap()).unwrap();
    fs::write(&live, "original").unwrap();
    fs::create_dir_all(temp.path().join("test")).unwrap();
    fs::write(temp.path().join("test/app.stub.js"), "stub").unwrap();

    gantry(temp.path()).arg("patch-vendor").assert().success();
    assert_eq!(fs::read_to_string(&live).unwrap(), "stub");

    gantry(temp.path())
        .arg("patch-vendor")
        .assert()
        .failure()
        .stderr(predicate::str::contains("already patched"));

    gantry(temp.path()).arg("restore-vendor").assert().success();
    assert_eq!(fs::read_to_string(&live).unwrap(), "original");
}

#[test]
fn test_restore_without_patch_fails() {
    let temp = TempDir::new().unwrap();
    gantry(temp.path())
        .arg("restore-vendor")
        .assert()
        .failure()
        .stderr(predicate::str::contains("restore-vendor"))
        .stderr(predicate::str::contains("No backup"));
}

#[test]
fn test_run_unknown_target_fails() {
    let temp = TempDir::new().unwrap();
    gantry(temp.path())
        .args(["run", "deploy"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown stage: deploy"));
}

#[cfg(unix)]
#[test]
fn test_run_host_task_by_name() {
    let temp = TempDir::new().unwrap();
    fs::write(
        temp.path().join("gantry.yaml"),
        "hostTasks:\n  touch:\n    program: touch\n    args: [\"{root}/touched\"]\n",
    )
    .unwrap();

    gantry(temp.path()).args(["run", "host:touch"]).assert().success();
    assert!(temp.path().join("touched").exists());
}
