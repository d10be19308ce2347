//! Test and helper mocks for hrc_core

use crossbeam_channel as xch;
use hrc_traits::{
    BoxError, ChallengeReply, ConnectReply, HeartRateApi, ScalarReply, Sample, SeriesReply,
};
use std::sync::{Mutex, MutexGuard};

/// Canned replies. `Err` entries become transport failures.
#[derive(Debug, Clone)]
pub struct Script {
    pub connect: Result<ConnectReply, String>,
    pub baseline: Result<ScalarReply, String>,
    pub challenge: Result<ChallengeReply, String>,
    pub disconnect: Result<ScalarReply, String>,
    pub baseline_series: Result<SeriesReply, String>,
    pub challenge_series: Result<SeriesReply, String>,
}

impl Default for Script {
    fn default() -> Self {
        Self {
            connect: Ok(ConnectReply {
                message: "connected to heart rate monitor".into(),
                error: String::new(),
            }),
            baseline: Ok(ScalarReply {
                message: "baseline established".into(),
                baseline: 60,
                max: 60,
                ..ScalarReply::default()
            }),
            challenge: Ok(ChallengeReply::default()),
            disconnect: Ok(ScalarReply {
                message: "disconnected".into(),
                baseline: 60,
                max: 72,
                delta: 12,
                ..ScalarReply::default()
            }),
            baseline_series: Ok(None),
            challenge_series: Ok(None),
        }
    }
}

/// Readings helper: every value present.
pub fn readings(v: &[i32]) -> Vec<Sample> {
    v.iter().copied().map(Some).collect()
}

/// A `HeartRateApi` answering from a mutable `Script`.
///
/// Series fetches can be gated: after `gate_series`, each fetch blocks until
/// the returned sender releases it, which lets tests hold a poll in flight
/// across a state change.
#[derive(Debug, Default)]
pub struct ScriptedApi {
    script: Mutex<Script>,
    calls: Mutex<Vec<&'static str>>,
    gate: Mutex<Option<xch::Receiver<()>>>,
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
}

impl ScriptedApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_script(script: Script) -> Self {
        Self {
            script: Mutex::new(script),
            ..Self::default()
        }
    }

    /// Edit the script in place; later calls see the change.
    pub fn set(&self, f: impl FnOnce(&mut Script)) {
        f(&mut lock(&self.script));
    }

    /// Names of the calls made so far, in order.
    pub fn calls(&self) -> Vec<&'static str> {
        lock(&self.calls).clone()
    }

    pub fn count(&self, name: &str) -> usize {
        lock(&self.calls).iter().filter(|c| **c == name).count()
    }

    /// Block series fetches until released through the returned sender.
    pub fn gate_series(&self) -> xch::Sender<()> {
        let (tx, rx) = xch::unbounded();
        *lock(&self.gate) = Some(rx);
        tx
    }

    fn record<T: Clone>(
        &self,
        name: &'static str,
        pick: impl FnOnce(&Script) -> &Result<T, String>,
    ) -> Result<T, BoxError> {
        lock(&self.calls).push(name);
        let r = pick(&lock(&self.script)).clone();
        r.map_err(|e| Box::new(std::io::Error::other(e)) as BoxError)
    }

    fn wait_gate(&self) {
        let gate = lock(&self.gate).clone();
        if let Some(rx) = gate {
            // a dropped sender opens the gate for good
            let _ = rx.recv();
        }
    }
}

impl HeartRateApi for ScriptedApi {
    fn connect(&self) -> Result<ConnectReply, BoxError> {
        self.record("connect", |s| &s.connect)
    }

    fn start_baseline(&self) -> Result<ScalarReply, BoxError> {
        self.record("baseline", |s| &s.baseline)
    }

    fn start_challenge(&self) -> Result<ChallengeReply, BoxError> {
        self.record("challenge", |s| &s.challenge)
    }

    fn disconnect(&self) -> Result<ScalarReply, BoxError> {
        self.record("disconnect", |s| &s.disconnect)
    }

    fn fetch_baseline_series(&self) -> Result<SeriesReply, BoxError> {
        self.wait_gate();
        self.record("baseline-series", |s| &s.baseline_series)
    }

    fn fetch_challenge_series(&self) -> Result<SeriesReply, BoxError> {
        self.wait_gate();
        self.record("challenge-series", |s| &s.challenge_series)
    }
}
