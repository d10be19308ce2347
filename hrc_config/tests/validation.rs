use hrc_config::{Rotation, load_file_or_default, load_toml};
use rstest::rstest;
use std::fs;
use tempfile::tempdir;

const FULL: &str = r#"
[api]
base_url = "http://10.0.0.5:8081/hrm"
request_timeout_ms = 3000

[polling]
interval_ms = 500

[session]
step_timeout_ms = 9000
challenge_ms = 20000
clear_series_on_finish = true

[simulator]
baseline_ms = 1000
sample_rate_ms = 100
resting_bpm = 58
peak_bpm = 140

[logging]
file = "hrc.log"
level = "debug"
rotation = "daily"
"#;

#[test]
fn parses_full_document() {
    let cfg = load_toml(FULL).expect("parse TOML");
    cfg.validate().expect("valid config should pass");
    assert_eq!(cfg.api.request_timeout_ms, 3000);
    assert_eq!(cfg.polling.interval_ms, 500);
    assert!(cfg.session.clear_series_on_finish);
    assert_eq!(cfg.simulator.peak_bpm, 140);
    assert_eq!(cfg.logging.rotation, Rotation::Daily);
    assert_eq!(cfg.logging.file.as_deref(), Some("hrc.log"));
}

#[rstest]
#[case("[polling]\ninterval_ms = 0\n", "polling.interval_ms must be >= 1")]
#[case("[polling]\ninterval_ms = 120000\n", "unreasonably large")]
#[case("[api]\nbase_url = \"\"\n", "api.base_url must not be empty")]
#[case("[api]\nbase_url = \"ftp://x\"\n", "must start with http")]
#[case("[api]\nrequest_timeout_ms = 0\n", "request_timeout_ms must be >= 1")]
#[case("[session]\nstep_timeout_ms = 0\n", "step_timeout_ms must be >= 1")]
#[case("[simulator]\nsample_rate_ms = 0\n", "sample_rate_ms must be >= 1")]
#[case("[simulator]\nresting_bpm = 70\npeak_bpm = 60\n", "peak_bpm")]
#[case(
    "[session]\nstep_timeout_ms = 3000\n[simulator]\nbaseline_ms = 3000\n",
    "baseline_ms must be below session.step_timeout_ms"
)]
fn rejects_out_of_range(#[case] toml: &str, #[case] needle: &str) {
    let cfg = load_toml(toml).expect("parse TOML");
    let err = cfg.validate().expect_err("should reject");
    assert!(
        format!("{err}").contains(needle),
        "expected {needle:?} in {err}"
    );
}

#[test]
fn unknown_rotation_is_a_parse_error() {
    assert!(load_toml("[logging]\nrotation = \"weekly\"\n").is_err());
}

#[test]
fn missing_file_falls_back_to_defaults() {
    let dir = tempdir().unwrap();
    let cfg = load_file_or_default(&dir.path().join("nope.toml")).unwrap();
    assert_eq!(cfg.polling.interval_ms, 1000);
}

#[test]
fn malformed_file_reports_path() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("bad.toml");
    fs::write(&path, "[polling\n").unwrap();
    let err = load_file_or_default(&path).unwrap_err();
    assert!(err.to_string().contains("bad.toml"));
}
