//! In-process simulated heart-rate service.
//!
//! Mirrors the real backend: connect resets everything, baseline samples for
//! a fixed window and returns the integer mean, challenge starts recording,
//! disconnect reports max/delta over both series and then resets. Sensor
//! readings are generated lazily from the clock, one per sample period.
use crate::error::ClientError;
use hrc_traits::clock::{Clock, MonotonicClock};
use hrc_traits::{
    BoxError, Bpm, ChallengeReply, ConnectReply, HeartRateApi, ScalarReply, SeriesReply,
};
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};

pub const MSG_CONNECTED: &str = "connected";
pub const MSG_BASELINE: &str = "baseline";
pub const MSG_DELTA: &str = "delta";
pub const ERR_CONNECT_FIRST_BASELINE: &str = "failed to record baseline... you must connect first";
pub const ERR_CONNECT_FIRST_DISCONNECT: &str = "failed to disconnect... you must connect first";
pub const ERR_NO_BASELINE: &str = "failed to establish baseline";
pub const ERR_UNREACHABLE: &str = "could not find heart rate service";

/// Small deterministic wobble applied on top of the heart-rate curve.
const WOBBLE: [Bpm; 6] = [0, 1, -1, 2, -2, 1];
/// Beats per minute gained per challenge sample until the peak is reached.
const RAMP_PER_SAMPLE: Bpm = 4;

#[derive(Debug, Clone)]
pub struct SimProfile {
    /// How long `start_baseline` samples before answering.
    pub baseline_window: Duration,
    /// Sensor notification period.
    pub sample_period: Duration,
    pub resting_bpm: Bpm,
    pub peak_bpm: Bpm,
    /// Pretend the monitor cannot be found on connect.
    pub fail_connect: bool,
}

impl Default for SimProfile {
    fn default() -> Self {
        Self {
            baseline_window: Duration::from_secs(5),
            sample_period: Duration::from_millis(1000),
            resting_bpm: 62,
            peak_bpm: 118,
            fail_connect: false,
        }
    }
}

#[derive(Debug, Default)]
struct SimState {
    connected: bool,
    subscribed: bool,
    baseline: Bpm,
    max: Bpm,
    delta: Bpm,
    // None until first reset, served as JSON null
    baseline_values: Option<Vec<Bpm>>,
    challenge_values: Option<Vec<Bpm>>,
    baseline_established: bool,
    challenge_active: bool,
    last_sample: Option<Instant>,
    samples_seen: u64,
    challenge_samples: u64,
}

impl SimState {
    fn reset_baseline(&mut self) {
        self.baseline = 0;
        self.baseline_values = Some(Vec::new());
        self.baseline_established = false;
    }

    fn reset(&mut self) {
        self.reset_baseline();
        self.delta = 0;
        self.max = 0;
        self.challenge_values = Some(Vec::new());
        self.challenge_active = false;
        tracing::debug!("simulator: reset all data");
    }

    fn series_max(&self) -> Bpm {
        self.baseline_values
            .iter()
            .chain(self.challenge_values.iter())
            .flatten()
            .copied()
            .max()
            .unwrap_or(0)
    }
}

pub struct SimulatedMonitor<C: Clock = MonotonicClock> {
    clock: C,
    profile: SimProfile,
    state: Mutex<SimState>,
}

impl SimulatedMonitor<MonotonicClock> {
    pub fn new(profile: SimProfile) -> Self {
        Self::with_clock(profile, MonotonicClock::new())
    }
}

impl<C: Clock> SimulatedMonitor<C> {
    pub fn with_clock(profile: SimProfile, clock: C) -> Self {
        Self {
            clock,
            profile,
            state: Mutex::new(SimState::default()),
        }
    }

    pub fn profile(&self) -> &SimProfile {
        &self.profile
    }

    fn state(&self) -> Result<MutexGuard<'_, SimState>, ClientError> {
        self.state
            .lock()
            .map_err(|_| ClientError::Transport("simulator state poisoned".into()))
    }

    /// Emit every reading that became due since the last one.
    fn pump(&self, st: &mut SimState) {
        if !st.connected || !st.subscribed {
            return;
        }
        let period = self.profile.sample_period.max(Duration::from_millis(1));
        let now = self.clock.now();
        let Some(mut last) = st.last_sample else {
            st.last_sample = Some(now);
            return;
        };
        while now.saturating_duration_since(last) >= period {
            last += period;
            let v = self.next_reading(st);
            self.on_reading(st, v);
        }
        st.last_sample = Some(last);
    }

    fn next_reading(&self, st: &mut SimState) -> Bpm {
        let n = st.samples_seen;
        st.samples_seen += 1;
        // The strap reports zero while it settles after subscribing.
        if n == 0 {
            return 0;
        }
        let wobble = WOBBLE[(n % WOBBLE.len() as u64) as usize];
        let p = &self.profile;
        if st.challenge_active {
            st.challenge_samples += 1;
            let climb = i64::from(RAMP_PER_SAMPLE) * st.challenge_samples as i64;
            let room = i64::from((p.peak_bpm - p.resting_bpm).max(0));
            p.resting_bpm + climb.min(room) as Bpm + wobble
        } else {
            p.resting_bpm + wobble
        }
    }

    fn on_reading(&self, st: &mut SimState, v: Bpm) {
        if v == 0 {
            tracing::trace!("simulator: sensor initializing");
            return;
        }
        if !st.challenge_active && st.baseline_established {
            // idle between baseline and challenge; don't grow the baseline
            return;
        }
        let target = if st.challenge_active {
            &mut st.challenge_values
        } else {
            &mut st.baseline_values
        };
        target.get_or_insert_with(Vec::new).push(v);
    }
}

fn to_series(values: &Option<Vec<Bpm>>) -> SeriesReply {
    values
        .as_ref()
        .map(|vs| vs.iter().copied().map(Some).collect())
}

impl<C: Clock + Send + Sync> HeartRateApi for SimulatedMonitor<C> {
    fn connect(&self) -> Result<ConnectReply, BoxError> {
        let mut st = self.state()?;
        st.reset();
        if self.profile.fail_connect {
            tracing::warn!("simulator: monitor unreachable");
            return Ok(ConnectReply {
                message: String::new(),
                error: ERR_UNREACHABLE.to_string(),
            });
        }
        // reconnecting while connected counts as success
        st.connected = true;
        st.subscribed = false;
        st.last_sample = None;
        st.samples_seen = 0;
        st.challenge_samples = 0;
        tracing::info!("simulator: connected");
        Ok(ConnectReply {
            message: MSG_CONNECTED.to_string(),
            error: String::new(),
        })
    }

    fn start_baseline(&self) -> Result<ScalarReply, BoxError> {
        {
            let mut st = self.state()?;
            st.reset_baseline();
            if !st.connected {
                return Ok(ScalarReply {
                    error: ERR_CONNECT_FIRST_BASELINE.to_string(),
                    ..ScalarReply::default()
                });
            }
            if !st.subscribed {
                st.subscribed = true;
                st.last_sample = Some(self.clock.now());
            }
            tracing::info!("simulator: establishing baseline heart rate");
        }

        // Lock released while waiting so series reads see the baseline grow.
        self.clock.sleep(self.profile.baseline_window);

        let mut st = self.state()?;
        self.pump(&mut st);
        let values = st.baseline_values.clone().unwrap_or_default();
        if values.is_empty() {
            return Ok(ScalarReply {
                error: ERR_NO_BASELINE.to_string(),
                ..ScalarReply::default()
            });
        }
        let sum: i64 = values.iter().map(|&v| i64::from(v)).sum();
        st.baseline = (sum / values.len() as i64) as Bpm;
        st.baseline_established = true;
        tracing::info!(heart_rate = st.baseline, "simulator: baseline established");
        Ok(ScalarReply {
            message: MSG_BASELINE.to_string(),
            baseline: st.baseline,
            ..ScalarReply::default()
        })
    }

    fn start_challenge(&self) -> Result<ChallengeReply, BoxError> {
        let mut st = self.state()?;
        self.pump(&mut st);
        st.challenge_active = true;
        tracing::info!("simulator: recording heart rate");
        Ok(ChallengeReply::default())
    }

    fn disconnect(&self) -> Result<ScalarReply, BoxError> {
        let mut st = self.state()?;
        self.pump(&mut st);
        if st.challenge_active {
            st.max = st.series_max();
            st.delta = st.max - st.baseline;
            tracing::info!(max = st.max, delta = st.delta, "simulator: final result");
        }
        let mut reply = ScalarReply {
            message: MSG_DELTA.to_string(),
            baseline: st.baseline,
            max: st.max,
            delta: st.delta,
            error: String::new(),
        };
        if st.connected {
            st.connected = false;
            st.subscribed = false;
            tracing::info!("simulator: disconnected");
        } else {
            reply.error = ERR_CONNECT_FIRST_DISCONNECT.to_string();
        }
        st.reset();
        Ok(reply)
    }

    fn fetch_baseline_series(&self) -> Result<SeriesReply, BoxError> {
        let mut st = self.state()?;
        self.pump(&mut st);
        Ok(to_series(&st.baseline_values))
    }

    fn fetch_challenge_series(&self) -> Result<SeriesReply, BoxError> {
        let mut st = self.state()?;
        self.pump(&mut st);
        Ok(to_series(&st.challenge_values))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hrc_traits::clock::test_clock::TestClock;

    fn profile() -> SimProfile {
        SimProfile {
            baseline_window: Duration::from_secs(5),
            sample_period: Duration::from_secs(1),
            resting_bpm: 60,
            peak_bpm: 100,
            fail_connect: false,
        }
    }

    fn monitor() -> (SimulatedMonitor<TestClock>, TestClock) {
        let clock = TestClock::new();
        (SimulatedMonitor::with_clock(profile(), clock.clone()), clock)
    }

    #[test]
    fn series_are_null_before_first_connect() {
        let (m, _) = monitor();
        assert_eq!(m.fetch_baseline_series().unwrap(), None);
        assert_eq!(m.fetch_challenge_series().unwrap(), None);
    }

    #[test]
    fn baseline_requires_connection() {
        let (m, _) = monitor();
        let r = m.start_baseline().unwrap();
        assert_eq!(r.error, ERR_CONNECT_FIRST_BASELINE);
    }

    #[test]
    fn baseline_is_mean_of_window_skipping_initial_zero() {
        let (m, _) = monitor();
        assert_eq!(m.connect().unwrap().message, MSG_CONNECTED);
        let r = m.start_baseline().unwrap();
        assert!(r.error.is_empty(), "{}", r.error);
        let series = m.fetch_baseline_series().unwrap().unwrap();
        // 5 readings due, first one is the settling zero
        assert_eq!(series.len(), 4);
        let sum: i32 = series.iter().flatten().sum();
        assert_eq!(r.baseline, sum / 4);
    }

    #[test]
    fn baseline_stops_growing_until_challenge() {
        let (m, clock) = monitor();
        m.connect().unwrap();
        m.start_baseline().unwrap();
        let before = m.fetch_baseline_series().unwrap().unwrap().len();
        clock.advance(Duration::from_secs(10));
        assert_eq!(m.fetch_baseline_series().unwrap().unwrap().len(), before);
        assert_eq!(m.fetch_challenge_series().unwrap(), Some(vec![]));
    }

    #[test]
    fn challenge_ramps_and_disconnect_reports_delta() {
        let (m, clock) = monitor();
        m.connect().unwrap();
        let base = m.start_baseline().unwrap().baseline;
        m.start_challenge().unwrap();
        clock.advance(Duration::from_secs(20));
        let challenge = m.fetch_challenge_series().unwrap().unwrap();
        assert_eq!(challenge.len(), 20);
        let peak = challenge.iter().flatten().copied().max().unwrap();
        assert!(peak > base);

        let r = m.disconnect().unwrap();
        assert!(r.error.is_empty());
        assert_eq!(r.baseline, base);
        assert_eq!(r.max, peak);
        assert_eq!(r.delta, peak - base);
        // data wiped on finish
        assert_eq!(m.fetch_challenge_series().unwrap(), Some(vec![]));
    }

    #[test]
    fn disconnect_without_connect_reports_error() {
        let (m, _) = monitor();
        let r = m.disconnect().unwrap();
        assert_eq!(r.error, ERR_CONNECT_FIRST_DISCONNECT);
    }

    #[test]
    fn unreachable_monitor_fails_connect() {
        let m = SimulatedMonitor::with_clock(
            SimProfile {
                fail_connect: true,
                ..profile()
            },
            TestClock::new(),
        );
        let r = m.connect().unwrap();
        assert_eq!(r.error, ERR_UNREACHABLE);
        assert!(r.message.is_empty());
    }
}
