//! View-state published to the presentation layer after every mutation.

use crate::phase::Phase;
use crossbeam_channel as xch;
use hrc_traits::{Bpm, Sample};
use serde::Serialize;

/// Remote result of the last state-changing call; cleared on reset.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SessionResult {
    pub message: String,
    pub error: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    /// Increases by one per publication.
    pub version: u64,
    pub phase: Phase,
    pub baseline: Bpm,
    pub max: Bpm,
    pub delta: Bpm,
    pub connected: bool,
    pub message: String,
    pub error_message: Option<String>,
    /// A user-triggered call is still in flight.
    pub busy: bool,
    pub baseline_series: Vec<Sample>,
    pub challenge_series: Vec<Sample>,
    pub labels: Vec<usize>,
}

/// Receives every published snapshot.
pub trait SnapshotSink {
    fn publish(&mut self, snapshot: &Snapshot);
}

impl SnapshotSink for xch::Sender<Snapshot> {
    fn publish(&mut self, snapshot: &Snapshot) {
        // a dropped receiver just means nobody is watching anymore
        let _ = self.try_send(snapshot.clone());
    }
}

impl SnapshotSink for Vec<Snapshot> {
    fn publish(&mut self, snapshot: &Snapshot) {
        self.push(snapshot.clone());
    }
}
