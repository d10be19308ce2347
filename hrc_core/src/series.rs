//! Baseline/challenge series and the statistics derived from them.
//!
//! Every poll returns the complete series recorded so far, so the store
//! overwrites instead of appending. Scalars are recomputed after every
//! mutation and `delta == max - baseline` holds after each recomputation.
use hrc_traits::{Bpm, Sample};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SeriesStore {
    baseline_series: Vec<Sample>,
    /// Challenge series as displayed, padding included.
    challenge_series: Vec<Sample>,
    /// Leading gap entries inserted by `align_challenge_after_baseline`.
    challenge_offset: usize,
    baseline: Bpm,
    /// Highest max reported by the service so far.
    reported_max: Bpm,
    /// Scalars pinned by a disconnect reply (or zeroed pending one).
    final_max: Option<Bpm>,
    max: Bpm,
    delta: Bpm,
}

/// Highest non-gap reading across the given series.
pub fn series_max<'a>(series: impl IntoIterator<Item = &'a [Sample]>) -> Option<Bpm> {
    series
        .into_iter()
        .flat_map(|s| s.iter().flatten().copied())
        .max()
}

impl SeriesStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn baseline_series(&self) -> &[Sample] {
        &self.baseline_series
    }

    pub fn challenge_series(&self) -> &[Sample] {
        &self.challenge_series
    }

    pub fn challenge_offset(&self) -> usize {
        self.challenge_offset
    }

    pub fn baseline(&self) -> Bpm {
        self.baseline
    }

    pub fn max(&self) -> Bpm {
        self.max
    }

    pub fn delta(&self) -> Bpm {
        self.delta
    }

    /// Length of the shared label axis.
    pub fn axis_len(&self) -> usize {
        self.baseline_series.len().max(self.challenge_series.len())
    }

    /// Zero-based ordinal labels for the shared axis.
    pub fn labels(&self) -> Vec<usize> {
        (0..self.axis_len()).collect()
    }

    pub fn replace_baseline(&mut self, series: Vec<Sample>) {
        self.baseline_series = series;
        self.recompute();
    }

    pub fn replace_challenge(&mut self, series: Vec<Sample>) {
        let mut padded = Vec::with_capacity(self.challenge_offset + series.len());
        padded.resize(self.challenge_offset, None);
        padded.extend(series);
        self.challenge_series = padded;
        self.recompute();
    }

    /// Authoritative resting baseline from the service.
    pub fn set_baseline_scalar(&mut self, value: Bpm) {
        self.baseline = value;
        self.recompute();
    }

    /// Fold a max reported by the service into the running max.
    pub fn observe_max(&mut self, value: Bpm) {
        self.reported_max = self.reported_max.max(value);
        self.recompute();
    }

    /// Shift the challenge trace so it starts where the baseline trace ends.
    ///
    /// Pads with `len(baseline) - 1` gaps (none for an empty baseline). The
    /// padding is kept for every later `replace_challenge`.
    pub fn align_challenge_after_baseline(&mut self) {
        let raw = self.challenge_series.split_off(self.challenge_offset.min(self.challenge_series.len()));
        self.challenge_offset = self.baseline_series.len().saturating_sub(1);
        self.challenge_series.clear();
        self.replace_challenge(raw);
    }

    /// Zero the scalars while a final reply is outstanding. Series stay.
    pub fn zero_scalars(&mut self) {
        self.baseline = 0;
        self.reported_max = 0;
        self.final_max = Some(0);
        self.recompute();
    }

    /// Pin the final scalars reported when the session is finished.
    pub fn apply_final(&mut self, baseline: Bpm, max: Bpm) {
        self.baseline = baseline;
        self.reported_max = max;
        self.final_max = Some(max);
        self.recompute();
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    fn recompute(&mut self) {
        self.max = match self.final_max {
            Some(m) => m,
            None => {
                let seen = series_max([self.baseline_series.as_slice(), self.challenge_series.as_slice()])
                    .unwrap_or(0);
                // the baseline is itself an average of readings, so max never sits below it
                seen.max(self.reported_max).max(self.baseline)
            }
        };
        // scalars come off the wire; extreme values saturate instead of overflowing
        self.delta = self.max.saturating_sub(self.baseline);
    }
}
