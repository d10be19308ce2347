//! Text rendering of a snapshot.
use crate::chart::sparkline;
use hrc_core::Snapshot;
use hrc_traits::Bpm;
use std::fmt::Write as _;

/// How the delta cell is shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeltaStyle {
    Zero,
    Negative,
    Positive,
}

impl DeltaStyle {
    pub fn of(delta: Bpm) -> Self {
        match delta.signum() {
            0 => DeltaStyle::Zero,
            -1 => DeltaStyle::Negative,
            _ => DeltaStyle::Positive,
        }
    }

    /// Marker printed next to the value in plain-text output.
    pub fn marker(self) -> &'static str {
        match self {
            DeltaStyle::Zero => "",
            DeltaStyle::Negative => " ▼",
            DeltaStyle::Positive => " ▲",
        }
    }
}

const CHART_WIDTH: usize = 60;

/// Multi-line panel: stats table, status lines and the two-trace chart.
pub fn render_panel(s: &Snapshot) -> String {
    let mut out = String::new();
    let delta = format!("{}{}", s.delta, DeltaStyle::of(s.delta).marker());
    let _ = writeln!(out, "{:<10}{:<10}{:<10}", "Baseline", "Max", "Delta");
    let _ = writeln!(out, "{:<10}{:<10}{:<10}", s.baseline, s.max, delta);
    if s.busy {
        let _ = writeln!(out, "… working");
    }
    let _ = writeln!(
        out,
        "Connected: {}  ({})",
        if s.connected { "yes" } else { "no" },
        s.phase
    );
    if !s.message.is_empty() {
        let _ = writeln!(out, "{}", s.message);
    }
    if let Some(e) = &s.error_message {
        let _ = writeln!(out, "Error: {e}");
    }
    if !s.labels.is_empty() {
        let [b, c] = sparkline(&s.baseline_series, &s.challenge_series, CHART_WIDTH);
        let _ = writeln!(out, "Baseline  |{b}|");
        let _ = writeln!(out, "Challenge |{c}|");
    }
    out
}
