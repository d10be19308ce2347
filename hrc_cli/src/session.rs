//! Command bodies: scripted session, kiosk loop, health and self-check.

use crate::backend::DynApi;
use hrc_config::Config;
use hrc_core::{Action, ScriptCfg, SessionCfg, SessionMachine, Snapshot};
use hrc_traits::HeartRateApi;
use hrc_ui::{DeltaStyle, TerminalSink};
use serde_json::json;
use std::io::BufRead;
use std::sync::atomic::AtomicBool;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

fn unix_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| d.as_secs())
}

fn session_summary(snap: &Snapshot, backend: &str, duration: Duration) -> serde_json::Value {
    json!({
        "timestamp": unix_secs(),
        "backend": backend,
        "duration_ms": u64::try_from(duration.as_millis()).unwrap_or(u64::MAX),
        "baseline": snap.baseline,
        "max": snap.max,
        "delta": snap.delta,
        "message": snap.message,
        "baseline_samples": snap.baseline_series.iter().flatten().count(),
        "challenge_samples": snap.challenge_series.iter().flatten().count(),
    })
}

pub fn run_session(
    cfg: &Config,
    api: DynApi,
    backend: &str,
    challenge_ms: Option<u64>,
    json: bool,
    shutdown: &AtomicBool,
) -> eyre::Result<()> {
    let mut script: ScriptCfg = (&cfg.session).into();
    if let Some(ms) = challenge_ms {
        script.challenge_for = Duration::from_millis(ms);
    }
    let mut m = SessionMachine::new(api, SessionCfg::from(cfg));
    let start = Instant::now();
    let snap = hrc_core::run_scripted(&mut m, &script, shutdown)?;
    let elapsed = start.elapsed();

    if json {
        println!("{}", session_summary(&snap, backend, elapsed));
    } else {
        println!(
            "Session complete in {:.1}s: baseline {} bpm, max {} bpm, delta {}{}",
            elapsed.as_secs_f64(),
            snap.baseline,
            snap.max,
            snap.delta,
            DeltaStyle::of(snap.delta).marker()
        );
    }
    Ok(())
}

/// Read kiosk commands from stdin; `quit` or EOF ends the session.
fn spawn_stdin_reader() -> crossbeam_channel::Receiver<Action> {
    let (tx, rx) = crossbeam_channel::unbounded();
    let spawned = std::thread::Builder::new()
        .name("hrc-stdin".into())
        .spawn(move || {
            for line in std::io::stdin().lock().lines() {
                let Ok(line) = line else { break };
                let word = line.trim();
                if word.is_empty() {
                    continue;
                }
                if matches!(word, "quit" | "q" | "exit") {
                    break;
                }
                match word.parse::<Action>() {
                    Ok(a) => {
                        if tx.send(a).is_err() {
                            break;
                        }
                    }
                    Err(e) => eprintln!("{e}; try connect|baseline|challenge|finish|quit"),
                }
            }
        });
    if let Err(e) = spawned {
        tracing::error!(error = %e, "failed to spawn stdin reader");
    }
    rx
}

pub fn run_kiosk(cfg: &Config, api: DynApi, json: bool, shutdown: &AtomicBool) -> eyre::Result<()> {
    let mut m = SessionMachine::new(api, SessionCfg::from(cfg));
    m.add_sink(TerminalSink::new(std::io::stdout(), json));
    if !json {
        println!("Commands: connect | baseline | challenge | finish | quit");
    }
    let actions = spawn_stdin_reader();
    let script: ScriptCfg = (&cfg.session).into();
    let snap = hrc_core::drive(&mut m, &actions, &script, shutdown)?;
    tracing::info!(baseline = snap.baseline, max = snap.max, delta = snap.delta, "kiosk closed");
    Ok(())
}

/// One idempotent read; any reply (even null) means the service is up.
pub fn run_health(cfg: &Config, api: &dyn HeartRateApi, backend: &str, json: bool) -> eyre::Result<()> {
    let start = Instant::now();
    let series = api
        .fetch_baseline_series()
        .map_err(|e| eyre::Report::new(hrc_core::map_client_error(&*e)))?;
    let latency_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);
    let target = if backend == "http" {
        cfg.api.base_url.as_str()
    } else {
        "simulator"
    };
    if json {
        println!(
            "{}",
            json!({
                "status": "ok",
                "backend": backend,
                "target": target,
                "latency_ms": latency_ms,
                "baseline_samples": series.as_ref().map_or(0, Vec::len),
            })
        );
    } else {
        println!("ok: {target} answered in {latency_ms} ms");
    }
    Ok(())
}

pub fn self_check(cfg: &Config, simulate: bool, json: bool) {
    let backend = if simulate { "simulator" } else { "http" };
    if json {
        println!(
            "{}",
            json!({
                "status": "ok",
                "backend": backend,
                "base_url": cfg.api.base_url,
                "request_timeout_ms": cfg.api.request_timeout_ms,
                "poll_interval_ms": cfg.polling.interval_ms,
                "step_timeout_ms": cfg.session.step_timeout_ms,
                "challenge_ms": cfg.session.challenge_ms,
                "clear_series_on_finish": cfg.session.clear_series_on_finish,
            })
        );
        return;
    }
    println!("config ok");
    println!("  backend               {backend}");
    println!("  api.base_url          {}", cfg.api.base_url);
    println!("  api.request_timeout   {} ms", cfg.api.request_timeout_ms);
    println!("  polling.interval      {} ms", cfg.polling.interval_ms);
    println!("  session.step_timeout  {} ms", cfg.session.step_timeout_ms);
    println!("  session.challenge     {} ms", cfg.session.challenge_ms);
    if simulate {
        let s = &cfg.simulator;
        println!(
            "  simulator             baseline {} ms, sample {} ms, {}..{} bpm",
            s.baseline_ms, s.sample_rate_ms, s.resting_bpm, s.peak_bpm
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_counts_only_readings() {
        let snap = Snapshot {
            baseline: 60,
            max: 72,
            delta: 12,
            baseline_series: vec![Some(60), None, Some(61)],
            challenge_series: vec![None, Some(72)],
            ..Snapshot::default()
        };
        let v = session_summary(&snap, "simulator", Duration::from_millis(1500));
        assert_eq!(v["baseline_samples"], 2);
        assert_eq!(v["challenge_samples"], 1);
        assert_eq!(v["duration_ms"], 1500);
        assert_eq!(v["delta"], 12);
    }
}
