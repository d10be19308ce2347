//! Backend selection: the HTTP service or the in-process simulator.

use hrc_client::{SimProfile, SimulatedMonitor};
use hrc_config::Config;
use hrc_traits::HeartRateApi;
use std::time::Duration;

pub type DynApi = Box<dyn HeartRateApi>;

pub fn sim_profile(cfg: &Config) -> SimProfile {
    let s = &cfg.simulator;
    SimProfile {
        baseline_window: Duration::from_millis(s.baseline_ms),
        sample_period: Duration::from_millis(s.sample_rate_ms),
        resting_bpm: s.resting_bpm,
        peak_bpm: s.peak_bpm,
        fail_connect: s.fail_connect,
    }
}

/// Build the backend and a short name for it.
pub fn build(cfg: &Config, simulate: bool) -> eyre::Result<(DynApi, &'static str)> {
    if simulate {
        tracing::info!("using simulated monitor");
        return Ok((Box::new(SimulatedMonitor::new(sim_profile(cfg))), "simulator"));
    }
    http(cfg)
}

#[cfg(feature = "http")]
fn http(cfg: &Config) -> eyre::Result<(DynApi, &'static str)> {
    let timeout = Duration::from_millis(cfg.api.request_timeout_ms);
    let monitor = hrc_client::HttpMonitor::new(cfg.api.base_url.trim(), timeout);
    tracing::info!(base_url = monitor.base_url(), "using heart-rate service");
    Ok((Box::new(monitor), "http"))
}

#[cfg(not(feature = "http"))]
fn http(_cfg: &Config) -> eyre::Result<(DynApi, &'static str)> {
    eyre::bail!("built without the http feature; rerun with --simulate")
}
