//! Periodic polling timers.
//!
//! A `Poller` owns one ticker thread that calls its tick closure once per
//! period. `PollingController` owns the two named timer slots (baseline and
//! challenge) and guarantees at most one of them is armed at any instant.
//!
//! Safety: each `Poller` spawns exactly one thread, which is shut down and
//! joined when the `Poller` is dropped, so no timer outlives its slot.
use crossbeam_channel as xch;
use serde::Serialize;
use std::fmt;
use std::time::Duration;

/// Which series a timer slot polls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Stream {
    Baseline,
    Challenge,
}

impl fmt::Display for Stream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stream::Baseline => f.write_str("baseline poll"),
            Stream::Challenge => f.write_str("challenge poll"),
        }
    }
}

pub struct Poller {
    stream: Stream,
    /// Dropping the sender wakes the ticker immediately.
    stop_tx: Option<xch::Sender<()>>,
    join_handle: Option<std::thread::JoinHandle<()>>,
}

impl Poller {
    /// Arm a repeating timer. The first tick fires one `period` after arming.
    ///
    /// `tick` is fire-and-forget: it must hand work off and return quickly.
    /// Returning `false` means the consumer is gone and the timer ends.
    pub fn spawn<F>(stream: Stream, period: Duration, mut tick: F) -> Self
    where
        F: FnMut() -> bool + Send + 'static,
    {
        let (stop_tx, stop_rx) = xch::bounded::<()>(1);
        let period = period.max(Duration::from_millis(1));

        let join_handle = std::thread::Builder::new()
            .name(format!("hrc-{}", stream_tag(stream)))
            .spawn(move || {
                loop {
                    match stop_rx.recv_timeout(period) {
                        Err(xch::RecvTimeoutError::Timeout) => {
                            if !tick() {
                                tracing::debug!(%stream, "tick consumer disconnected, exiting timer");
                                break;
                            }
                        }
                        // explicit stop or owner dropped
                        Ok(()) | Err(xch::RecvTimeoutError::Disconnected) => break,
                    }
                }
                tracing::trace!(%stream, "timer thread exiting cleanly");
            });

        let join_handle = match join_handle {
            Ok(h) => Some(h),
            Err(e) => {
                tracing::error!(%stream, error = %e, "failed to spawn timer thread");
                None
            }
        };

        Self {
            stream,
            stop_tx: Some(stop_tx),
            join_handle,
        }
    }

    pub fn stream(&self) -> Stream {
        self.stream
    }

    pub fn is_running(&self) -> bool {
        self.join_handle.as_ref().is_some_and(|h| !h.is_finished())
    }
}

fn stream_tag(stream: Stream) -> &'static str {
    match stream {
        Stream::Baseline => "baseline-poll",
        Stream::Challenge => "challenge-poll",
    }
}

impl Drop for Poller {
    fn drop(&mut self) {
        drop(self.stop_tx.take());
        // The ticker only ever blocks in recv_timeout, so this join is prompt.
        if let Some(handle) = self.join_handle.take() {
            match handle.join() {
                Ok(()) => tracing::trace!(stream = %self.stream, "timer thread joined"),
                Err(e) => tracing::warn!(?e, "timer thread panicked during shutdown"),
            }
        }
    }
}

/// Owner of the baseline and challenge timer slots.
#[derive(Default)]
pub struct PollingController {
    baseline: Option<Poller>,
    challenge: Option<Poller>,
}

impl PollingController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Arm the baseline timer, superseding any armed timer.
    pub fn start_baseline_polling<F>(&mut self, interval: Duration, tick: F)
    where
        F: FnMut() -> bool + Send + 'static,
    {
        // old timers are torn down before the new one is armed
        self.stop_all();
        self.baseline = Some(Poller::spawn(Stream::Baseline, interval, tick));
        tracing::debug!(interval_ms = interval.as_millis() as u64, "baseline polling armed");
    }

    /// Arm the challenge timer; baseline polling never runs alongside it.
    pub fn start_challenge_polling<F>(&mut self, interval: Duration, tick: F)
    where
        F: FnMut() -> bool + Send + 'static,
    {
        self.stop_all();
        self.challenge = Some(Poller::spawn(Stream::Challenge, interval, tick));
        tracing::debug!(interval_ms = interval.as_millis() as u64, "challenge polling armed");
    }

    pub fn stop(&mut self, stream: Stream) {
        let slot = match stream {
            Stream::Baseline => &mut self.baseline,
            Stream::Challenge => &mut self.challenge,
        };
        if slot.take().is_some() {
            tracing::debug!(%stream, "polling stopped");
        }
    }

    /// Clear both slots. Idempotent.
    pub fn stop_all(&mut self) {
        self.stop(Stream::Baseline);
        self.stop(Stream::Challenge);
    }

    /// The armed slot, if any.
    pub fn active(&self) -> Option<Stream> {
        self.baseline
            .as_ref()
            .or(self.challenge.as_ref())
            .map(Poller::stream)
    }

    /// Number of armed slots; never more than one.
    pub fn active_count(&self) -> usize {
        usize::from(self.baseline.is_some()) + usize::from(self.challenge.is_some())
    }
}

impl fmt::Debug for PollingController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PollingController")
            .field("active", &self.active())
            .finish()
    }
}
