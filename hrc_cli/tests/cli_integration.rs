use assert_cmd::prelude::*;
use predicates::prelude::*;
use rstest::rstest;
use std::fs;
use std::path::PathBuf;
use std::process::Command;
use tempfile::tempdir;

// Short windows so a simulated session finishes in well under a second
fn write_valid_config(dir: &tempfile::TempDir) -> PathBuf {
    let toml = r#"
[api]
# unused with --simulate
base_url = "http://127.0.0.1:1/hrm"
request_timeout_ms = 500

[polling]
interval_ms = 20

[session]
step_timeout_ms = 5000
challenge_ms = 200

[simulator]
baseline_ms = 100
sample_rate_ms = 10
resting_bpm = 60
peak_bpm = 120
"#;
    let path = dir.path().join("cfg.toml");
    fs::write(&path, toml).unwrap();
    path
}

fn hrc(cfg: &PathBuf) -> Command {
    let mut cmd = Command::cargo_bin("hrc").unwrap();
    cmd.env_remove("HRC_BASE_URL")
        .env_remove("HRC_POLL_INTERVAL_MS")
        .env_remove("RUST_LOG");
    // Always include a config to avoid relying on the default path
    cmd.arg("--config").arg(cfg);
    cmd
}

#[rstest]
#[case(&["--help"], 0, "Usage:", "stdout")]
#[case(&["--simulate", "session"], 0, "Session complete", "stdout")]
#[case(&["--simulate", "session", "--challenge-ms", "50"], 0, "delta", "stdout")]
#[case(&["session", "--challenge-ms"], 2, "value", "stderr")]
#[case(&["self-check"], 0, "config ok", "stdout")]
#[case(&["--simulate", "health"], 0, "ok: simulator", "stdout")]
#[case(&["session"], 3, "could not be reached", "stderr")]
#[case(&["health"], 3, "could not be reached", "stderr")]
fn cli_table_cases(
    #[case] args: &[&str],
    #[case] exit_code: i32,
    #[case] needle: &str,
    #[case] stream: &str,
) {
    let dir = tempdir().unwrap();
    let cfg = write_valid_config(&dir);

    let mut cmd = hrc(&cfg);
    for a in args {
        cmd.arg(a);
    }

    let assert = cmd.assert().code(exit_code);
    match stream {
        "stdout" => {
            assert.stdout(predicate::str::contains(needle));
        }
        "stderr" => {
            assert.stderr(predicate::str::contains(needle));
        }
        other => panic!("unknown stream: {other}"),
    }
}

#[rstest]
fn cli_reports_invalid_config_value() {
    let dir = tempdir().unwrap();
    let cfg = dir.path().join("bad.toml");
    fs::write(&cfg, "[polling]\ninterval_ms = 0\n").unwrap();

    hrc(&cfg)
        .arg("self-check")
        .assert()
        .failure()
        .stderr(predicate::str::contains("polling.interval_ms must be >= 1"));
}

#[rstest]
fn env_override_is_validated() {
    let dir = tempdir().unwrap();
    let cfg = write_valid_config(&dir);

    hrc(&cfg)
        .env("HRC_BASE_URL", "ftp://kiosk/hrm")
        .arg("self-check")
        .assert()
        .failure()
        .stderr(predicate::str::contains("must start with http"));
}

#[rstest]
fn missing_config_file_uses_defaults() {
    let dir = tempdir().unwrap();
    hrc(&dir.path().join("absent.toml"))
        .arg("self-check")
        .assert()
        .success()
        .stdout(predicate::str::contains("http://127.0.0.1:8081/hrm"));
}

#[rstest]
fn kiosk_reads_commands_until_quit() {
    let dir = tempdir().unwrap();
    let cfg = write_valid_config(&dir);

    assert_cmd::Command::from_std(hrc(&cfg))
        .args(["--simulate", "kiosk"])
        .write_stdin("connect\nbogus\nquit\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("Connected:"))
        .stderr(predicate::str::contains("unknown action"));
}
