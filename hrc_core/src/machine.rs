//! Session state machine.
//!
//! `SessionMachine` is the only owner of session state. User actions and
//! completed remote calls are applied on the caller's thread, one event at a
//! time. Remote calls run on short-lived worker threads and come back as
//! `Event::Completed` through the machine's event channel; polling timers
//! post `Event::Tick` through the same channel. Every event carries the
//! session epoch it was issued under, and anything issued under an older
//! epoch (or no longer matching the phase) is dropped as stale.
use crate::client_error::map_client_error;
use crate::config::SessionCfg;
use crate::error::{CallError, SessionError};
use crate::phase::{Action, Phase};
use crate::poller::{PollingController, Stream};
use crate::series::SeriesStore;
use crate::snapshot::{SessionResult, Snapshot, SnapshotSink};
use crossbeam_channel as xch;
use hrc_traits::{
    BoxError, Bpm, ChallengeReply, ConnectReply, HeartRateApi, ScalarReply, SeriesReply,
};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Outcome of one remote call.
#[derive(Debug)]
pub enum Reply {
    Connect(Result<ConnectReply, CallError>),
    Baseline(Result<ScalarReply, CallError>),
    Challenge(Result<ChallengeReply, CallError>),
    Disconnect(Result<ScalarReply, CallError>),
    Series(Stream, Result<SeriesReply, CallError>),
}

impl Reply {
    /// Replies to user actions (as opposed to polls) drive the busy flag.
    fn is_user_call(&self) -> bool {
        !matches!(self, Reply::Series(..))
    }
}

#[derive(Debug)]
pub enum Event {
    /// A polling timer fired.
    Tick { stream: Stream, epoch: u64 },
    /// A remote call finished.
    Completed { epoch: u64, reply: Reply },
}

/// What `handle` did with an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// State changed and a snapshot was published.
    Applied,
    /// A tick turned into a series fetch.
    Dispatched,
    /// Current, but nothing to change (e.g. empty series).
    Unchanged,
    /// Issued under an older epoch or for another phase; dropped.
    Stale,
}

#[derive(Debug, Clone, Copy)]
enum Call {
    Connect,
    StartBaseline,
    StartChallenge,
    Disconnect,
    Series(Stream),
}

impl Call {
    fn name(self) -> &'static str {
        match self {
            Call::Connect => "connect",
            Call::StartBaseline => "baseline",
            Call::StartChallenge => "challenge",
            Call::Disconnect => "disconnect",
            Call::Series(Stream::Baseline) => "baseline-series",
            Call::Series(Stream::Challenge) => "challenge-series",
        }
    }

    fn invoke<A: HeartRateApi + ?Sized>(self, api: &A) -> Reply {
        fn norm<T>(r: Result<T, BoxError>) -> Result<T, CallError> {
            r.map_err(|e| map_client_error(&*e))
        }
        match self {
            Call::Connect => Reply::Connect(norm(api.connect())),
            Call::StartBaseline => Reply::Baseline(norm(api.start_baseline())),
            Call::StartChallenge => Reply::Challenge(norm(api.start_challenge())),
            Call::Disconnect => Reply::Disconnect(norm(api.disconnect())),
            Call::Series(Stream::Baseline) => {
                Reply::Series(Stream::Baseline, norm(api.fetch_baseline_series()))
            }
            Call::Series(Stream::Challenge) => {
                Reply::Series(Stream::Challenge, norm(api.fetch_challenge_series()))
            }
        }
    }

    fn failed(self, e: CallError) -> Reply {
        match self {
            Call::Connect => Reply::Connect(Err(e)),
            Call::StartBaseline => Reply::Baseline(Err(e)),
            Call::StartChallenge => Reply::Challenge(Err(e)),
            Call::Disconnect => Reply::Disconnect(Err(e)),
            Call::Series(s) => Reply::Series(s, Err(e)),
        }
    }
}

/// Runs remote calls off the event loop and posts their completions back.
struct Dispatcher<A> {
    api: Arc<A>,
    tx: xch::Sender<Event>,
}

impl<A: HeartRateApi + 'static> Dispatcher<A> {
    fn dispatch(&self, epoch: u64, call: Call) {
        let api = Arc::clone(&self.api);
        let tx = self.tx.clone();
        let spawned = std::thread::Builder::new()
            .name(format!("hrc-{}", call.name()))
            .spawn(move || {
                let reply = call.invoke(api.as_ref());
                // machine gone: nobody left to care
                let _ = tx.send(Event::Completed { epoch, reply });
            });
        if let Err(e) = spawned {
            tracing::error!(call = call.name(), error = %e, "failed to spawn request thread");
            let reply = call.failed(CallError::Transport(format!("could not start request: {e}")));
            let _ = self.tx.send(Event::Completed { epoch, reply });
        }
    }
}

/// Split a well-formed reply carrying a non-empty `error` into a remote failure.
fn remote<T>(r: Result<T, CallError>, error_of: impl Fn(&T) -> &str) -> Result<T, CallError> {
    let v = r?;
    match CallError::from_reply_field(error_of(&v)) {
        Some(e) => Err(e),
        None => Ok(v),
    }
}

pub struct SessionMachine<A: HeartRateApi + 'static> {
    phase: Phase,
    /// Bumped by connect, get-baseline and disconnect.
    epoch: u64,
    store: SeriesStore,
    result: SessionResult,
    polling: PollingController,
    dispatcher: Dispatcher<A>,
    events: xch::Receiver<Event>,
    cfg: SessionCfg,
    /// User-action calls in flight.
    in_flight: usize,
    challenge_pending: bool,
    /// Baseline and max on screen when finish was requested.
    held: Option<(Bpm, Bpm)>,
    version: u64,
    sinks: Vec<Box<dyn SnapshotSink>>,
}

impl<A: HeartRateApi + 'static> SessionMachine<A> {
    pub fn new(api: A, cfg: SessionCfg) -> Self {
        Self::with_shared(Arc::new(api), cfg)
    }

    pub fn with_shared(api: Arc<A>, cfg: SessionCfg) -> Self {
        let (tx, events) = xch::unbounded();
        Self {
            phase: Phase::Disconnected,
            epoch: 0,
            store: SeriesStore::new(),
            result: SessionResult::default(),
            polling: PollingController::new(),
            dispatcher: Dispatcher { api, tx },
            events,
            cfg,
            in_flight: 0,
            challenge_pending: false,
            held: None,
            version: 0,
            sinks: Vec::new(),
        }
    }

    pub fn add_sink(&mut self, sink: impl SnapshotSink + 'static) {
        self.sinks.push(Box::new(sink));
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn store(&self) -> &SeriesStore {
        &self.store
    }

    pub fn result(&self) -> &SessionResult {
        &self.result
    }

    pub fn polling(&self) -> &PollingController {
        &self.polling
    }

    pub fn cfg(&self) -> &SessionCfg {
        &self.cfg
    }

    pub fn is_busy(&self) -> bool {
        self.in_flight > 0
    }

    pub fn is_challenge_pending(&self) -> bool {
        self.challenge_pending
    }

    /// Channel carrying ticks and completions; drive it with `handle`.
    pub fn events(&self) -> &xch::Receiver<Event> {
        &self.events
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            version: self.version,
            phase: self.phase,
            baseline: self.store.baseline(),
            max: self.store.max(),
            delta: self.store.delta(),
            connected: self.phase != Phase::Disconnected,
            message: self.result.message.clone(),
            error_message: (!self.result.error.is_empty()).then(|| self.result.error.clone()),
            busy: self.is_busy(),
            baseline_series: self.store.baseline_series().to_vec(),
            challenge_series: self.store.challenge_series().to_vec(),
            labels: self.store.labels(),
        }
    }

    // ── user actions ────────────────────────────────────────────────────────

    pub fn dispatch(&mut self, action: Action) -> Result<(), SessionError> {
        match action {
            Action::Connect => {
                self.connect();
                Ok(())
            }
            Action::GetBaseline => self.get_baseline(),
            Action::StartChallenge => self.start_challenge(),
            Action::Disconnect => {
                self.disconnect();
                Ok(())
            }
        }
    }

    /// Reset all data and connect. Valid from any phase.
    pub fn connect(&mut self) {
        self.polling.stop_all();
        self.epoch += 1;
        self.store.clear();
        self.result = SessionResult::default();
        self.challenge_pending = false;
        self.held = None;
        self.phase = Phase::Disconnected;
        tracing::info!(epoch = self.epoch, "connecting to monitor");
        self.issue(Call::Connect);
        self.publish();
    }

    /// Start (or restart) baseline capture.
    pub fn get_baseline(&mut self) -> Result<(), SessionError> {
        self.guard(Action::GetBaseline)?;
        self.epoch += 1;
        self.store.clear();
        self.result = SessionResult::default();
        self.challenge_pending = false;
        self.phase = Phase::BaselineRecording;
        // supersedes any earlier baseline timer
        self.arm(Stream::Baseline);
        tracing::info!(epoch = self.epoch, "recording baseline");
        self.issue(Call::StartBaseline);
        self.publish();
        Ok(())
    }

    /// Move from baseline to challenge once the service confirms.
    pub fn start_challenge(&mut self) -> Result<(), SessionError> {
        self.guard(Action::StartChallenge)?;
        if self.challenge_pending {
            return Err(SessionError::Pending {
                action: Action::StartChallenge,
            });
        }
        self.polling.stop(Stream::Baseline);
        self.challenge_pending = true;
        self.result = SessionResult::default();
        tracing::info!(epoch = self.epoch, "starting challenge");
        self.issue(Call::StartChallenge);
        self.publish();
        Ok(())
    }

    /// Finish the session. Valid from any phase.
    pub fn disconnect(&mut self) {
        self.polling.stop_all();
        self.epoch += 1;
        self.challenge_pending = false;
        // a second finish keeps what was on screen before the first
        if self.held.is_none() {
            self.held = Some((self.store.baseline(), self.store.max()));
        }
        if self.cfg.clear_series_on_finish {
            self.store.clear();
        }
        self.store.zero_scalars();
        self.result = SessionResult::default();
        self.phase = Phase::Disconnected;
        tracing::info!(epoch = self.epoch, "finishing session");
        self.issue(Call::Disconnect);
        self.publish();
    }

    /// Fire a poll for `stream` right away, as if its timer had ticked.
    pub fn poll_now(&mut self, stream: Stream) -> Disposition {
        let epoch = self.epoch;
        self.handle(Event::Tick { stream, epoch })
    }

    // ── event loop ──────────────────────────────────────────────────────────

    pub fn handle(&mut self, event: Event) -> Disposition {
        match event {
            Event::Tick { stream, epoch } => {
                if epoch != self.epoch || !self.polls(stream) {
                    tracing::debug!(%stream, epoch, current = self.epoch, "stale tick dropped");
                    return Disposition::Stale;
                }
                self.dispatcher.dispatch(epoch, Call::Series(stream));
                Disposition::Dispatched
            }
            Event::Completed { epoch, reply } => {
                let user_call = reply.is_user_call();
                if user_call {
                    self.in_flight = self.in_flight.saturating_sub(1);
                }
                if !self.is_current(epoch, &reply) {
                    tracing::debug!(epoch, current = self.epoch, phase = %self.phase, ?reply, "stale response dropped");
                    if user_call {
                        // busy flag changed
                        self.publish();
                    }
                    return Disposition::Stale;
                }
                let d = self.apply(reply);
                if user_call && d == Disposition::Unchanged {
                    self.publish();
                }
                d
            }
        }
    }

    /// Handle every event that is already queued. Returns how many were handled.
    pub fn pump(&mut self) -> usize {
        let mut n = 0;
        while let Ok(ev) = self.events.try_recv() {
            self.handle(ev);
            n += 1;
        }
        n
    }

    /// Wait up to `timeout` for one event and handle it.
    pub fn wait_event(&mut self, timeout: Duration) -> Option<Disposition> {
        let ev = self.events.recv_timeout(timeout).ok()?;
        Some(self.handle(ev))
    }

    /// Handle events until `done` holds or `timeout` elapses. Returns `done`'s final value.
    pub fn run_until(&mut self, timeout: Duration, done: impl Fn(&Self) -> bool) -> bool {
        let deadline = Instant::now() + timeout;
        loop {
            if done(self) {
                return true;
            }
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return false;
            }
            match self.events.recv_timeout(remaining) {
                Ok(ev) => {
                    self.handle(ev);
                }
                Err(_) => return done(self),
            }
        }
    }

    // ── internals ───────────────────────────────────────────────────────────

    fn guard(&self, action: Action) -> Result<(), SessionError> {
        if self.phase.accepts(action) {
            Ok(())
        } else {
            tracing::warn!(%action, phase = %self.phase, "action rejected");
            Err(SessionError::Rejected {
                action,
                phase: self.phase,
            })
        }
    }

    fn polls(&self, stream: Stream) -> bool {
        match stream {
            Stream::Baseline => self.phase == Phase::BaselineRecording,
            Stream::Challenge => self.phase == Phase::ChallengeRecording,
        }
    }

    fn is_current(&self, epoch: u64, reply: &Reply) -> bool {
        if epoch != self.epoch {
            return false;
        }
        match reply {
            Reply::Connect(_) | Reply::Disconnect(_) => true,
            Reply::Baseline(_) => self.phase.is_recording(),
            Reply::Challenge(_) => {
                self.phase == Phase::BaselineRecording && self.challenge_pending
            }
            Reply::Series(stream, _) => self.polls(*stream),
        }
    }

    fn issue(&mut self, call: Call) {
        self.in_flight += 1;
        self.dispatcher.dispatch(self.epoch, call);
    }

    fn arm(&mut self, stream: Stream) {
        let tx = self.dispatcher.tx.clone();
        let epoch = self.epoch;
        let tick = move || tx.send(Event::Tick { stream, epoch }).is_ok();
        let interval = self.cfg.poll_interval;
        match stream {
            Stream::Baseline => self.polling.start_baseline_polling(interval, tick),
            Stream::Challenge => self.polling.start_challenge_polling(interval, tick),
        }
    }

    fn fail(&mut self, what: &str, e: &CallError) {
        tracing::warn!(call = what, error = %e, phase = %self.phase, "remote call failed");
        self.result = SessionResult {
            message: String::new(),
            error: e.to_string(),
        };
    }

    fn apply(&mut self, reply: Reply) -> Disposition {
        match reply {
            Reply::Connect(r) => match remote(r, |c: &ConnectReply| c.error.as_str()) {
                Ok(c) => {
                    self.phase = Phase::Connected;
                    self.result = SessionResult {
                        message: c.message,
                        error: String::new(),
                    };
                    tracing::info!(phase = %self.phase, "monitor connected");
                }
                Err(e) => self.fail("connect", &e),
            },
            Reply::Baseline(r) => match remote(r, |s: &ScalarReply| s.error.as_str()) {
                Ok(s) => {
                    if s.delta != s.max - s.baseline {
                        tracing::debug!(baseline = s.baseline, max = s.max, delta = s.delta, "baseline reply delta not derived from max");
                    }
                    self.store.set_baseline_scalar(s.baseline);
                    self.store.observe_max(s.max);
                    self.result = SessionResult {
                        message: s.message,
                        error: String::new(),
                    };
                    tracing::info!(baseline = s.baseline, "baseline established");
                }
                Err(e) => self.fail("baseline", &e),
            },
            Reply::Challenge(r) => {
                self.challenge_pending = false;
                match remote(r, |c: &ChallengeReply| c.error.as_str()) {
                    Ok(_) => {
                        self.store.align_challenge_after_baseline();
                        self.phase = Phase::ChallengeRecording;
                        self.arm(Stream::Challenge);
                        tracing::info!(
                            offset = self.store.challenge_offset(),
                            "challenge recording"
                        );
                    }
                    Err(e) => {
                        self.fail("challenge", &e);
                        // still recording baseline; keep its timer running for a retry
                        self.arm(Stream::Baseline);
                    }
                }
            }
            Reply::Disconnect(r) => {
                let held = self.held.take();
                match r {
                    // a device-side failure still reports the session's scalars
                    Ok(s) => {
                        let err = CallError::from_reply_field(&s.error);
                        if err.is_some() && s.baseline == 0 && s.max == 0 {
                            self.restore(held);
                        } else {
                            self.finish_with(&s);
                        }
                        match err {
                            Some(e) => self.fail("disconnect", &e),
                            None => {
                                self.result = SessionResult {
                                    message: s.message,
                                    error: String::new(),
                                };
                            }
                        }
                    }
                    Err(e) => {
                        self.restore(held);
                        self.fail("disconnect", &e);
                    }
                }
            }
            Reply::Series(stream, r) => match r {
                Ok(Some(series)) if !series.is_empty() => {
                    tracing::trace!(%stream, len = series.len(), "series replaced");
                    match stream {
                        Stream::Baseline => self.store.replace_baseline(series),
                        Stream::Challenge => self.store.replace_challenge(series),
                    }
                }
                Ok(_) => return Disposition::Unchanged,
                Err(e) => self.fail(stream_call(stream), &e),
            },
        }
        self.publish();
        Disposition::Applied
    }

    fn finish_with(&mut self, s: &ScalarReply) {
        self.store.apply_final(s.baseline, s.max);
        if s.delta != self.store.delta() {
            tracing::warn!(
                reported = s.delta,
                derived = self.store.delta(),
                "final delta disagrees with max - baseline; using derived"
            );
        }
        tracing::info!(
            baseline = self.store.baseline(),
            max = self.store.max(),
            delta = self.store.delta(),
            "session finished"
        );
    }

    /// Put back the scalars shown before finish was requested.
    fn restore(&mut self, held: Option<(Bpm, Bpm)>) {
        if let Some((baseline, max)) = held {
            self.store.apply_final(baseline, max);
        }
    }

    fn publish(&mut self) {
        self.version += 1;
        let snap = self.snapshot();
        for sink in &mut self.sinks {
            sink.publish(&snap);
        }
    }
}

fn stream_call(stream: Stream) -> &'static str {
    match stream {
        Stream::Baseline => "baseline-series",
        Stream::Challenge => "challenge-series",
    }
}
