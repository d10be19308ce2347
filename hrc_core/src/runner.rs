//! Drivers that feed a `SessionMachine` from the outside world.
//!
//! - `run_scripted`: connect, record a baseline, run the challenge for a fixed
//!   time, finish. Used by `hrc session`.
//! - `drive`: apply actions from a channel (kiosk keys) until the channel
//!   closes or shutdown is requested, then finish the session.
use crate::config::ScriptCfg;
use crate::error::{Report, Result as CoreResult, SessionError};
use crate::machine::SessionMachine;
use crate::phase::{Action, Phase};
use crate::snapshot::Snapshot;
use crossbeam_channel as xch;
use hrc_traits::HeartRateApi;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

/// Longest a driver blocks before rechecking the shutdown flag.
const SHUTDOWN_POLL: Duration = Duration::from_millis(50);

/// Run one complete session unattended and return the final snapshot.
pub fn run_scripted<A>(
    m: &mut SessionMachine<A>,
    cfg: &ScriptCfg,
    shutdown: &AtomicBool,
) -> CoreResult<Snapshot>
where
    A: HeartRateApi + 'static,
{
    tracing::info!(
        challenge_ms = u64::try_from(cfg.challenge_for.as_millis()).unwrap_or(u64::MAX),
        "scripted session start"
    );

    m.connect();
    settle(m, Action::Connect, cfg.step_timeout, shutdown)?;
    if m.phase() != Phase::Connected {
        return Err(step_failed(m, Action::Connect));
    }

    m.get_baseline().map_err(Report::new)?;
    settle(m, Action::GetBaseline, cfg.step_timeout, shutdown)?;
    if !m.result().error.is_empty() {
        return Err(step_failed(m, Action::GetBaseline));
    }

    if !shutdown.load(Ordering::Relaxed) {
        m.start_challenge().map_err(Report::new)?;
        settle(m, Action::StartChallenge, cfg.step_timeout, shutdown)?;
        if m.phase() != Phase::ChallengeRecording {
            return Err(step_failed(m, Action::StartChallenge));
        }
        record_for(m, cfg.challenge_for, shutdown);
    }

    m.disconnect();
    settle(m, Action::Disconnect, cfg.step_timeout, shutdown)?;
    if !m.result().error.is_empty() {
        return Err(step_failed(m, Action::Disconnect));
    }

    let snap = m.snapshot();
    tracing::info!(
        baseline = snap.baseline,
        max = snap.max,
        delta = snap.delta,
        "scripted session complete"
    );
    Ok(snap)
}

/// Apply actions until `actions` closes or `shutdown` is set, then finish.
pub fn drive<A>(
    m: &mut SessionMachine<A>,
    actions: &xch::Receiver<Action>,
    cfg: &ScriptCfg,
    shutdown: &AtomicBool,
) -> CoreResult<Snapshot>
where
    A: HeartRateApi + 'static,
{
    enum Input {
        Action(Action),
        Event(crate::machine::Event),
        Closed,
        Idle,
    }

    while !shutdown.load(Ordering::Relaxed) {
        let input = xch::select! {
            recv(actions) -> a => a.map_or(Input::Closed, Input::Action),
            recv(m.events()) -> e => e.map_or(Input::Idle, Input::Event),
            default(SHUTDOWN_POLL) => Input::Idle,
        };
        match input {
            Input::Action(action) => {
                if let Err(e) = m.dispatch(action) {
                    // the kiosk shows these as disabled buttons; not fatal
                    tracing::warn!(error = %e, "action ignored");
                }
            }
            Input::Event(ev) => {
                m.handle(ev);
            }
            Input::Closed => break,
            Input::Idle => {}
        }
    }

    if m.phase() != Phase::Disconnected || m.is_busy() {
        m.disconnect();
        // best effort; the service may already be gone
        let never = AtomicBool::new(false);
        if let Err(e) = settle(m, Action::Disconnect, cfg.step_timeout, &never) {
            tracing::warn!(error = %e, "finish did not complete");
        }
    }
    Ok(m.snapshot())
}

/// Process events until no user call is in flight.
fn settle<A>(
    m: &mut SessionMachine<A>,
    action: Action,
    timeout: Duration,
    shutdown: &AtomicBool,
) -> CoreResult<()>
where
    A: HeartRateApi + 'static,
{
    let deadline = Instant::now() + timeout;
    while m.is_busy() {
        if shutdown.load(Ordering::Relaxed) && action != Action::Disconnect {
            tracing::info!(%action, "shutdown requested while waiting");
            return Ok(());
        }
        let now = Instant::now();
        if now >= deadline {
            tracing::error!(%action, "step timed out");
            return Err(Report::new(SessionError::StepTimeout { action }));
        }
        m.wait_event((deadline - now).min(SHUTDOWN_POLL));
    }
    Ok(())
}

/// Keep the challenge running for `span`, handling polls as they land.
fn record_for<A>(m: &mut SessionMachine<A>, span: Duration, shutdown: &AtomicBool)
where
    A: HeartRateApi + 'static,
{
    let deadline = Instant::now() + span;
    loop {
        if shutdown.load(Ordering::Relaxed) {
            tracing::info!("shutdown requested; finishing early");
            return;
        }
        let now = Instant::now();
        if now >= deadline {
            return;
        }
        m.wait_event((deadline - now).min(SHUTDOWN_POLL));
    }
}

fn step_failed<A>(m: &SessionMachine<A>, action: Action) -> Report
where
    A: HeartRateApi + 'static,
{
    let message = match m.result().error.as_str() {
        "" => format!("ended {}", m.phase()),
        e => e.to_string(),
    };
    tracing::error!(%action, %message, "step failed");
    Report::new(SessionError::StepFailed { action, message })
}
