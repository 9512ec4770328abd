//! CLI options interaction tests
//!
//! These tests run the binary end to end. None of them reach the network:
//! candidates are given with --ip or loaded from a saved result.

use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::fs;
use std::process::Command;
use tempfile::TempDir;

const CONFIG_VARS: [&str; 10] = [
    "TIMEOUT_SECONDS",
    "MAX_CONCURRENCY",
    "TOP_N",
    "SAMPLES_PER_RANGE",
    "RANGES_URL",
    "TRACE_HOST",
    "OUTPUT_FILE",
    "RUN_DEADLINE_SECONDS",
    "LOG_FILE",
    "ENABLE_COLOR",
];

/// Helper function to create a test command isolated in a temporary directory
fn create_test_cmd(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("edge-ip-selector").unwrap();
    cmd.current_dir(dir.path()).env("NO_COLOR", "1");
    for var in CONFIG_VARS {
        cmd.env_remove(var);
    }
    cmd
}

const SAVED_RESULT: &str = r#"[
    {
        "ip": "162.159.192.9",
        "response_time": 41.5,
        "available": true
    },
    {
        "ip": "162.159.192.1",
        "response_time": 12.25,
        "available": true
    }
]
"#;

#[test]
fn test_help_lists_options() {
    let dir = TempDir::new().unwrap();
    create_test_cmd(&dir)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--concurrency"))
        .stdout(predicate::str::contains("--ranges-file"))
        .stdout(predicate::str::contains("--load"));
}

#[test]
fn test_version_flag() {
    let dir = TempDir::new().unwrap();
    create_test_cmd(&dir)
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_unprobeable_address_exits_with_none_available() {
    let dir = TempDir::new().unwrap();
    create_test_cmd(&dir)
        .args(["--ip", "256.1.1.1", "--no-save", "--timeout", "1"])
        .assert()
        .code(4)
        .stdout(predicate::str::contains("No available IP found."));

    assert!(!dir.path().join("warp_best_ips.json").exists());
}

#[test]
fn test_load_missing_file() {
    let dir = TempDir::new().unwrap();
    create_test_cmd(&dir)
        .arg("--load")
        .assert()
        .code(4)
        .stdout(predicate::str::contains("No saved result at warp_best_ips.json"))
        .stdout(predicate::str::contains("No available IP found."));
}

#[test]
fn test_load_prints_saved_ranking_in_order() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("warp_best_ips.json"), SAVED_RESULT).unwrap();

    create_test_cmd(&dir)
        .arg("--load")
        .assert()
        .success()
        .stdout(predicate::str::contains("1. 162.159.192.1 - 12.25ms"))
        .stdout(predicate::str::contains("2. 162.159.192.9 - 41.50ms"));
}

#[test]
fn test_load_respects_output_option() {
    let dir = TempDir::new().unwrap();
    fs::create_dir(dir.path().join("saved")).unwrap();
    fs::write(dir.path().join("saved").join("best.json"), SAVED_RESULT).unwrap();

    create_test_cmd(&dir)
        .args(["--load", "-o", "saved/best.json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("162.159.192.1"));
}

#[test]
fn test_malformed_saved_result_is_parse_error() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("warp_best_ips.json"), "{ not json").unwrap();

    create_test_cmd(&dir)
        .arg("--load")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("PARSE"));
}

#[test]
fn test_invalid_option_values_are_rejected() {
    let dir = TempDir::new().unwrap();

    create_test_cmd(&dir)
        .args(["--timeout", "0"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Duration must be greater than 0"));

    create_test_cmd(&dir)
        .args(["--concurrency", "5000"])
        .assert()
        .failure();

    create_test_cmd(&dir)
        .args(["--color", "--no-color"])
        .assert()
        .failure();
}

#[test]
fn test_conflicting_flags_are_config_errors() {
    let dir = TempDir::new().unwrap();
    create_test_cmd(&dir)
        .args(["--load", "--no-save"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("--load and --no-save cannot be used together"));
}

#[test]
fn test_env_file_is_applied() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join(".env"), "TIMEOUT_SECONDS=900\n").unwrap();

    create_test_cmd(&dir)
        .args(["--ip", "1.1.1.1", "--no-save"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("TIMEOUT_SECONDS"));
}

#[test]
fn test_empty_ranges_file_exits_with_candidate_error() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("ranges.txt"), "# no ranges\n\n").unwrap();

    create_test_cmd(&dir)
        .args(["--ranges-file", "ranges.txt", "--no-save"])
        .assert()
        .code(6)
        .stderr(predicate::str::contains("No candidate addresses available to test"));
}
