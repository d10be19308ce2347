#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
//! Config schema for the heart-rate kiosk client.
//!
//! - `Config` and sub-structs are deserialized from TOML and validated.
//! - Every section has defaults, so an empty file (or no file) is valid.
//! - A couple of environment variables override the TOML, matching how the
//!   kiosk page used to be configured at deploy time.
use serde::Deserialize;
use std::path::Path;

/// Overrides `api.base_url`.
pub const ENV_BASE_URL: &str = "HRC_BASE_URL";
/// Overrides `polling.interval_ms`.
pub const ENV_POLL_INTERVAL_MS: &str = "HRC_POLL_INTERVAL_MS";

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ApiCfg {
    /// Base URL of the heart-rate service; operation paths are appended.
    pub base_url: String,
    /// Per-request timeout (ms)
    pub request_timeout_ms: u64,
}

impl Default for ApiCfg {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8081/hrm".to_string(),
            request_timeout_ms: 10_000,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct PollingCfg {
    /// Series poll period (ms)
    pub interval_ms: u64,
}

impl Default for PollingCfg {
    fn default() -> Self {
        Self { interval_ms: 1000 }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct SessionCfg {
    /// How long the scripted runner waits for each step's reply (ms)
    pub step_timeout_ms: u64,
    /// Challenge duration for the scripted runner (ms)
    pub challenge_ms: u64,
    /// Drop both series as soon as a session is finished instead of at the next connect
    pub clear_series_on_finish: bool,
}

impl Default for SessionCfg {
    fn default() -> Self {
        Self {
            step_timeout_ms: 15_000,
            challenge_ms: 30_000,
            clear_series_on_finish: false,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct SimulatorCfg {
    /// Baseline sampling window (ms)
    pub baseline_ms: u64,
    /// Sensor notification period (ms)
    pub sample_rate_ms: u64,
    pub resting_bpm: i32,
    pub peak_bpm: i32,
    /// Simulate a monitor that cannot be found
    pub fail_connect: bool,
}

impl Default for SimulatorCfg {
    fn default() -> Self {
        Self {
            baseline_ms: 5000,
            sample_rate_ms: 1000,
            resting_bpm: 62,
            peak_bpm: 118,
            fail_connect: false,
        }
    }
}

#[derive(Debug, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Rotation {
    #[default]
    Never,
    Daily,
    Hourly,
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct Logging {
    pub file: Option<String>,  // path to .log (JSON lines)
    pub level: Option<String>, // "info","debug"
    /// Log rotation policy for `file`
    pub rotation: Rotation,
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct Config {
    pub api: ApiCfg,
    pub polling: PollingCfg,
    pub session: SessionCfg,
    /// In-process backend used with `--simulate`
    pub simulator: SimulatorCfg,
    pub logging: Logging,
}

pub fn load_toml(s: &str) -> Result<Config, toml::de::Error> {
    toml::from_str::<Config>(s)
}

/// Load config from `path`, falling back to defaults when the file is absent.
pub fn load_file_or_default(path: &Path) -> eyre::Result<Config> {
    if !path.exists() {
        return Ok(Config::default());
    }
    let text = std::fs::read_to_string(path)
        .map_err(|e| eyre::eyre!("failed to read config {}: {e}", path.display()))?;
    load_toml(&text).map_err(|e| eyre::eyre!("invalid configuration in {}: {e}", path.display()))
}

impl Config {
    /// Apply `HRC_*` environment overrides on top of the parsed file.
    pub fn apply_env_overrides(&mut self) -> eyre::Result<()> {
        self.apply_overrides_from(|k| std::env::var(k).ok())
    }

    /// Same as `apply_env_overrides`, with an injectable lookup.
    pub fn apply_overrides_from(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> eyre::Result<()> {
        if let Some(url) = lookup(ENV_BASE_URL).filter(|s| !s.trim().is_empty()) {
            self.api.base_url = url.trim().to_string();
        }
        if let Some(ms) = lookup(ENV_POLL_INTERVAL_MS) {
            self.polling.interval_ms = ms
                .trim()
                .parse()
                .map_err(|e| eyre::eyre!("{ENV_POLL_INTERVAL_MS}={ms:?} is not a valid ms value: {e}"))?;
        }
        Ok(())
    }

    pub fn validate(&self) -> eyre::Result<()> {
        // Api
        let url = self.api.base_url.trim();
        if url.is_empty() {
            eyre::bail!("api.base_url must not be empty");
        }
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            eyre::bail!("api.base_url must start with http:// or https://");
        }
        if self.api.request_timeout_ms == 0 {
            eyre::bail!("api.request_timeout_ms must be >= 1");
        }

        // Polling
        if self.polling.interval_ms == 0 {
            eyre::bail!("polling.interval_ms must be >= 1");
        }
        if self.polling.interval_ms > 60 * 1000 {
            eyre::bail!("polling.interval_ms is unreasonably large (>60s)");
        }

        // Session
        if self.session.step_timeout_ms == 0 {
            eyre::bail!("session.step_timeout_ms must be >= 1");
        }
        if self.session.challenge_ms > 60 * 60 * 1000 {
            eyre::bail!("session.challenge_ms is unreasonably large (>1h)");
        }

        // Simulator
        if self.simulator.sample_rate_ms == 0 {
            eyre::bail!("simulator.sample_rate_ms must be >= 1");
        }
        if !(20..=250).contains(&self.simulator.resting_bpm) {
            eyre::bail!("simulator.resting_bpm must be in [20, 250]");
        }
        if self.simulator.peak_bpm < self.simulator.resting_bpm || self.simulator.peak_bpm > 250 {
            eyre::bail!("simulator.peak_bpm must be in [resting_bpm, 250]");
        }
        // the simulated baseline call blocks for the whole window
        if self.simulator.baseline_ms >= self.session.step_timeout_ms {
            eyre::bail!("simulator.baseline_ms must be below session.step_timeout_ms");
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_is_all_defaults() {
        let cfg = load_toml("").unwrap();
        assert_eq!(cfg.polling.interval_ms, 1000);
        assert_eq!(cfg.api.base_url, "http://127.0.0.1:8081/hrm");
        assert_eq!(cfg.logging.rotation, Rotation::Never);
        cfg.validate().unwrap();
    }

    #[test]
    fn env_overrides_win_over_file() {
        let mut cfg = load_toml("[polling]\ninterval_ms = 250\n").unwrap();
        cfg.apply_overrides_from(|k| match k {
            ENV_BASE_URL => Some("http://kiosk:9000/hrm".into()),
            ENV_POLL_INTERVAL_MS => Some("500".into()),
            _ => None,
        })
        .unwrap();
        assert_eq!(cfg.api.base_url, "http://kiosk:9000/hrm");
        assert_eq!(cfg.polling.interval_ms, 500);
    }

    #[test]
    fn bad_env_interval_is_rejected() {
        let mut cfg = Config::default();
        let err = cfg
            .apply_overrides_from(|k| (k == ENV_POLL_INTERVAL_MS).then(|| "soon".to_string()))
            .unwrap_err();
        assert!(err.to_string().contains(ENV_POLL_INTERVAL_MS));
    }
}
