//! Chart data on the shared label axis.
use hrc_core::Snapshot;
use hrc_traits::Sample;
use serde::Serialize;

pub const BASELINE_LABEL: &str = "Baseline";
pub const CHALLENGE_LABEL: &str = "Challenge";
const BASELINE_COLOR: &str = "rgba(73, 131, 212, 0.4)";
const CHALLENGE_COLOR: &str = "rgba(255, 0, 50, 0.4)";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Dataset {
    pub label: &'static str,
    pub data: Vec<Sample>,
    pub border_color: &'static str,
}

/// Line-chart payload: one label per axis position, two traces.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChartData {
    pub labels: Vec<usize>,
    pub datasets: [Dataset; 2],
}

impl From<&Snapshot> for ChartData {
    fn from(s: &Snapshot) -> Self {
        Self {
            labels: s.labels.clone(),
            datasets: [
                Dataset {
                    label: BASELINE_LABEL,
                    data: s.baseline_series.clone(),
                    border_color: BASELINE_COLOR,
                },
                Dataset {
                    label: CHALLENGE_LABEL,
                    data: s.challenge_series.clone(),
                    border_color: CHALLENGE_COLOR,
                },
            ],
        }
    }
}

const BARS: [char; 8] = ['▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];

/// Render both traces as sparklines scaled to a common range.
///
/// Gaps and positions past a trace's end are blank. When the axis is wider
/// than `width`, only the newest `width` positions are drawn.
pub fn sparkline(baseline: &[Sample], challenge: &[Sample], width: usize) -> [String; 2] {
    let len = baseline.len().max(challenge.len());
    let start = len.saturating_sub(width);
    let readings = || {
        baseline
            .iter()
            .chain(challenge.iter())
            .flatten()
            .copied()
    };
    let (lo, hi) = match (readings().min(), readings().max()) {
        (Some(lo), Some(hi)) => (lo, hi),
        _ => return [" ".repeat(len - start), " ".repeat(len - start)],
    };
    let span = (i64::from(hi) - i64::from(lo)).max(1);
    let line = |series: &[Sample]| -> String {
        (start..len)
            .map(|i| match series.get(i).copied().flatten() {
                Some(v) => {
                    let step = (i64::from(v) - i64::from(lo)) * (BARS.len() as i64 - 1) / span;
                    BARS[usize::try_from(step).unwrap_or(0).min(BARS.len() - 1)]
                }
                None => ' ',
            })
            .collect()
    };
    [line(baseline), line(challenge)]
}
