//! CLI command contract tests
//!
//! Runs the `hashgrade` binary against temp workspaces with fixture datasets.
//!
//! Contract guarantees tested:
//! - Deterministic exit codes (0 scored, 1 not idempotent, 2 fatal)
//! - Stable JSON schema in `--format json` mode
//! - `results.json` written where requested
//! - Actionable error messages for failure paths

use std::path::Path;
#[cfg(unix)]
use std::path::PathBuf;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

// =============================================================================
// Test fixture helpers
// =============================================================================

/// Temp workspace with a `data/` directory holding one prose dataset.
fn setup_workspace() -> TempDir {
    let dir = TempDir::new().expect("create temp dir");
    let data = dir.path().join("data");
    std::fs::create_dir_all(&data).expect("create data dir");
    let prose: String = (0..2000)
        .map(|i| format!("line {i}: the quick brown fox jumps over the lazy dog\n"))
        .collect();
    std::fs::write(data.join("prose"), prose).expect("write dataset");
    dir
}

/// `hashgrade` running inside `workspace` with a clean environment.
fn hashgrade_in(workspace: &Path) -> Command {
    let mut cmd = Command::cargo_bin("hashgrade").expect("hashgrade binary should be built");
    cmd.current_dir(workspace);
    for var in [
        "HASHGRADE_CONFIG",
        "HASHGRADE_LOG_LEVEL",
        "HASHGRADE_LOG_FORMAT",
        "HASHGRADE_LIBRARY",
        "HASHGRADE_SYMBOL",
        "HASHGRADE_DATA",
        "HASHGRADE_SEED",
        "HASHGRADE_RESULTS",
        "RUST_LOG",
    ] {
        cmd.env_remove(var);
    }
    cmd.env("HASHGRADE_LOG_LEVEL", "warn");
    cmd
}

/// Compile `source` into a shared object inside `workspace`.
///
/// Returns `None` when no C compiler is available.
#[cfg(unix)]
fn compile_hash_library(workspace: &Path, name: &str, source: &str) -> Option<PathBuf> {
    let c_file = workspace.join(format!("{name}.c"));
    let library = workspace.join(format!("lib{name}.so"));
    std::fs::write(&c_file, source).expect("write C source");

    let status = match std::process::Command::new("cc")
        .args(["-shared", "-fPIC", "-o"])
        .arg(&library)
        .arg(&c_file)
        .status()
    {
        Ok(status) => status,
        Err(err) => {
            eprintln!("skipping: cannot run cc: {err}");
            return None;
        }
    };
    assert!(status.success(), "cc failed to build {}", c_file.display());
    Some(library)
}

#[cfg(unix)]
const DJB2_SOURCE: &str = r#"
unsigned short hash(const char *s) {
    unsigned long h = 5381;
    int c;
    while ((c = (unsigned char)*s++)) {
        h = h * 33 + c;
    }
    return (unsigned short)h;
}
"#;

#[cfg(unix)]
const COUNTER_SOURCE: &str = r#"
static unsigned short counter = 0;

unsigned short hash(const char *s) {
    (void)s;
    return counter++;
}
"#;

// =============================================================================
// hashgrade run
// =============================================================================

#[test]
fn run_reference_hash_scores_and_exits_zero() {
    let ws = setup_workspace();
    hashgrade_in(ws.path())
        .args(["run", "--reference", "siphash", "--seed", "1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("data/prose: 2000 lines"))
        .stdout(predicate::str::contains("score:"))
        .stdout(predicate::str::contains("leaderboard:"));
}

#[test]
fn run_json_format_is_parseable() {
    let ws = setup_workspace();
    let output = hashgrade_in(ws.path())
        .args(["run", "--reference", "siphash", "--format", "json"])
        .output()
        .expect("run hashgrade");
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));

    let value: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("stdout should be JSON");
    assert_eq!(value["status"], "scored");
    assert_eq!(value["datasets"][0]["lines"], 2000);
    assert_eq!(value["datasets"][0]["degrees_of_freedom"], 256);
    let score = value["score"].as_f64().unwrap();
    let max = value["max_score"].as_f64().unwrap();
    assert!(score > 0.0 && score <= max);
    assert_eq!(value["leaderboard_value"].as_u64().unwrap(), score.trunc() as u64);
}

#[test]
fn run_writes_results_json() {
    let ws = setup_workspace();
    let results = ws.path().join("out").join("results.json");
    hashgrade_in(ws.path())
        .args(["run", "--reference", "constant", "--results"])
        .arg(&results)
        .assert()
        .success();

    let text = std::fs::read_to_string(&results).expect("results.json written");
    let value: serde_json::Value = serde_json::from_str(&text).unwrap();
    assert_eq!(value["leaderboard"][0]["name"], "points");
    assert_eq!(value["leaderboard"][0]["value"], 0);
    assert_eq!(value["tests"][0]["status"], "passed");
    assert!(value["score"].as_f64().unwrap() < 1.0);
}

#[test]
fn run_reads_data_pattern_from_env() {
    let ws = setup_workspace();
    let other = ws.path().join("corpus");
    std::fs::create_dir_all(&other).unwrap();
    std::fs::write(other.join("words"), "alpha\nbeta\ngamma\n").unwrap();

    hashgrade_in(ws.path())
        .env("HASHGRADE_DATA", "corpus/*")
        .args(["run", "--reference", "length"])
        .assert()
        .success()
        .stdout(predicate::str::contains("corpus/words: 3 lines"))
        .stdout(predicate::str::contains("data/prose").not());
}

#[test]
fn run_with_no_datasets_scores_zero() {
    let ws = TempDir::new().unwrap();
    hashgrade_in(ws.path())
        .args(["run", "--reference", "siphash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("score: 0.00 / 0.00"));
}

#[test]
fn run_without_capability_is_fatal() {
    let ws = setup_workspace();
    hashgrade_in(ws.path())
        .arg("run")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("--library"));
}

#[test]
fn run_with_missing_library_is_fatal_with_remediation() {
    let ws = setup_workspace();
    hashgrade_in(ws.path())
        .args(["run", "--library", "./no-such-hash.so"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("no-such-hash.so"))
        .stderr(predicate::str::contains("Could not load"));
}

#[cfg(unix)]
#[test]
fn run_native_library_scores_and_exits_zero() {
    let ws = setup_workspace();
    let Some(library) = compile_hash_library(ws.path(), "djb2", DJB2_SOURCE) else {
        return;
    };
    let results = ws.path().join("results.json");

    hashgrade_in(ws.path())
        .args(["run", "--seed", "5", "--library"])
        .arg(&library)
        .arg("--results")
        .arg(&results)
        .assert()
        .code(0)
        .stdout(predicate::str::contains("data/prose: 2000 lines"));

    let value: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&results).unwrap()).unwrap();
    assert_eq!(value["tests"][0]["status"], "passed");
}

#[cfg(unix)]
#[test]
fn run_stateful_library_fails_with_exit_one() {
    let ws = setup_workspace();
    let Some(library) = compile_hash_library(ws.path(), "counter", COUNTER_SOURCE) else {
        return;
    };
    let results = ws.path().join("out").join("results.json");

    hashgrade_in(ws.path())
        .args(["run", "--seed", "5", "--library"])
        .arg(&library)
        .arg("--results")
        .arg(&results)
        .assert()
        .code(1)
        .stdout(predicate::str::contains("FAILED"))
        .stdout(predicate::str::contains("idempotent"))
        .stderr(predicate::str::contains("Hashing the same line twice"));

    let value: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&results).expect("results.json written"))
            .unwrap();
    assert_eq!(value["score"].as_f64(), Some(0.0));
    assert_eq!(value["leaderboard"][0]["value"], 0);
    assert_eq!(value["tests"][0]["status"], "failed");
    assert_eq!(value["tests"][0]["score"].as_f64(), Some(0.0));
    assert!(
        value["tests"][0]["output"]
            .as_str()
            .unwrap()
            .contains("data/prose")
    );
}

#[cfg(unix)]
#[test]
fn run_stateful_library_json_reports_hard_failure() {
    let ws = setup_workspace();
    let Some(library) = compile_hash_library(ws.path(), "counter", COUNTER_SOURCE) else {
        return;
    };

    let output = hashgrade_in(ws.path())
        .args(["run", "--format", "json", "--library"])
        .arg(&library)
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(1));
    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(value["status"], "failed");
    assert_eq!(value["hard_failure"], true);
}

#[test]
fn run_rejects_unknown_reference() {
    let ws = setup_workspace();
    hashgrade_in(ws.path())
        .args(["run", "--reference", "md5"])
        .assert()
        .code(2);
}

// =============================================================================
// Configuration
// =============================================================================

#[test]
fn config_file_is_honored() {
    let ws = setup_workspace();
    std::fs::write(
        ws.path().join("hashgrade.toml"),
        "[evaluation]\nper_dataset_max = 100.0\nseed = 4\n\n[report]\nleaderboard_name = \"uniformity\"\n",
    )
    .unwrap();

    let output = hashgrade_in(ws.path())
        .args(["run", "--reference", "siphash", "--format", "json"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert!((value["max_score"].as_f64().unwrap() - 100.0).abs() < 1e-9);

    hashgrade_in(ws.path())
        .arg("config")
        .assert()
        .success()
        .stdout(predicate::str::contains("leaderboard_name = \"uniformity\""))
        .stdout(predicate::str::contains("pattern = \"data/*\""));
}

#[test]
fn malformed_config_is_fatal() {
    let ws = setup_workspace();
    std::fs::write(ws.path().join("broken.toml"), "[evaluation\nn_bins = ").unwrap();
    hashgrade_in(ws.path())
        .args(["--config", "broken.toml", "config"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Error"));
}

#[test]
fn invalid_config_values_are_rejected() {
    let ws = setup_workspace();
    std::fs::write(ws.path().join("hashgrade.toml"), "[evaluation]\nper_dataset_max = -5.0\n").unwrap();
    hashgrade_in(ws.path())
        .arg("config")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("per_dataset_max"));
}

// =============================================================================
// hashgrade bins
// =============================================================================

#[test]
fn bins_plain_describes_default_spec() {
    let ws = TempDir::new().unwrap();
    hashgrade_in(ws.path())
        .arg("bins")
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "257 bins over [0, 65535], width 255 (last bin width 256)",
        ))
        .stdout(predicate::str::contains("256\t65280\t65535"));
}

#[test]
fn bins_json_follows_config() {
    let ws = TempDir::new().unwrap();
    std::fs::write(
        ws.path().join("hashgrade.toml"),
        "[evaluation]\nupper_bound = 99\nn_bins = 4\n",
    )
    .unwrap();
    let output = hashgrade_in(ws.path())
        .args(["bins", "--format", "json"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(value["bin_width"], 24);
    assert_eq!(value["boundaries"], serde_json::json!([0, 24, 48, 72, 99]));
}
