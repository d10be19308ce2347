use assert_cmd::prelude::*;
use rstest::rstest;
use std::fs;
use std::path::PathBuf;
use std::process::Command;
use tempfile::tempdir;

fn write_valid_config(dir: &tempfile::TempDir, base_url: &str) -> PathBuf {
    let toml = format!(
        r#"
[api]
base_url = "{base_url}"
request_timeout_ms = 500

[polling]
interval_ms = 20

[session]
step_timeout_ms = 5000
challenge_ms = 150

[simulator]
baseline_ms = 100
sample_rate_ms = 10
"#
    );
    let path = dir.path().join("cfg.toml");
    fs::write(&path, toml).unwrap();
    path
}

fn json_line_with(stdout: &[u8], key: &str) -> serde_json::Value {
    let stdout = String::from_utf8_lossy(stdout);
    let line = stdout
        .lines()
        .find(|l| l.contains(&format!("\"{key}\"")))
        .unwrap_or_else(|| panic!("no JSON line with {key}; stdout was: {stdout}"));
    serde_json::from_str(line).expect("valid JSON")
}

/// Validate the JSON summary of a completed simulated session.
#[rstest]
fn json_session_schema() {
    let dir = tempdir().unwrap();
    let cfg = write_valid_config(&dir, "http://127.0.0.1:1/hrm");

    let mut cmd = Command::cargo_bin("hrc").unwrap();
    cmd.env_remove("HRC_BASE_URL")
        .arg("--json")
        .arg("--log-level")
        .arg("error")
        .arg("--config")
        .arg(&cfg)
        .arg("--simulate")
        .arg("session");

    let out = cmd.assert().success().get_output().stdout.clone();
    let v = json_line_with(&out, "delta");

    assert!(v.get("timestamp").and_then(|x| x.as_u64()).is_some());
    assert!(v.get("duration_ms").and_then(|x| x.as_u64()).is_some());
    assert_eq!(v["backend"], "simulator");
    let baseline = v["baseline"].as_i64().unwrap();
    let max = v["max"].as_i64().unwrap();
    let delta = v["delta"].as_i64().unwrap();
    assert!(baseline > 0);
    assert_eq!(delta, max - baseline);
    assert!(v["baseline_samples"].as_u64().is_some());
    assert!(v.get("message").and_then(|x| x.as_str()).is_some());
}

/// Validate the JSON error shape when the service is unreachable.
#[rstest]
fn json_error_schema() {
    let dir = tempdir().unwrap();
    let cfg = write_valid_config(&dir, "http://127.0.0.1:1/hrm");

    let mut cmd = Command::cargo_bin("hrc").unwrap();
    cmd.env_remove("HRC_BASE_URL")
        .arg("--json")
        .arg("--log-level")
        .arg("error")
        .arg("--config")
        .arg(&cfg)
        .arg("session");

    let out = cmd.assert().code(3).get_output().stdout.clone();
    let v = json_line_with(&out, "reason");
    assert_eq!(v["reason"], "StepFailed");
    assert_eq!(v["step"], "connect");
    assert!(v["message"].as_str().unwrap().contains("What happened"));
}

/// Every kiosk snapshot line carries the chart payload.
#[rstest]
fn json_kiosk_snapshots() {
    let dir = tempdir().unwrap();
    let cfg = write_valid_config(&dir, "http://127.0.0.1:1/hrm");

    let mut cmd = assert_cmd::Command::cargo_bin("hrc").unwrap();
    cmd.env_remove("HRC_BASE_URL")
        .args(["--json", "--log-level", "error", "--simulate", "--config"])
        .arg(&cfg)
        .arg("kiosk")
        .write_stdin("connect\n");

    let out = cmd.assert().success().get_output().stdout.clone();
    let v = json_line_with(&out, "chart");
    assert!(v["phase"].is_string());
    assert_eq!(v["chart"]["datasets"][1]["label"], "Challenge");
    assert!(v.get("errorMessage").is_some());
}
