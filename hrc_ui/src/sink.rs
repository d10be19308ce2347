//! Snapshot sink that prints to a terminal (or any writer).
use crate::chart::ChartData;
use crate::panel::render_panel;
use hrc_core::{Snapshot, SnapshotSink};
use serde::Serialize;
use std::io::Write;

pub struct TerminalSink<W: Write> {
    out: W,
    /// One JSON object per snapshot instead of the text panel.
    json: bool,
    /// Skip snapshots whose visible content did not change.
    last: Option<Snapshot>,
}

#[derive(Serialize)]
struct JsonLine<'a> {
    #[serde(flatten)]
    snapshot: &'a Snapshot,
    chart: ChartData,
}

impl<W: Write> TerminalSink<W> {
    pub fn new(out: W, json: bool) -> Self {
        Self {
            out,
            json,
            last: None,
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn write(&mut self, s: &Snapshot) -> std::io::Result<()> {
        if self.json {
            let line = JsonLine {
                snapshot: s,
                chart: ChartData::from(s),
            };
            serde_json::to_writer(&mut self.out, &line)?;
            writeln!(self.out)?;
        } else {
            writeln!(self.out, "{}", render_panel(s))?;
        }
        self.out.flush()
    }
}

fn same_view(a: &Snapshot, b: &Snapshot) -> bool {
    Snapshot { version: 0, ..a.clone() } == Snapshot { version: 0, ..b.clone() }
}

impl<W: Write> SnapshotSink for TerminalSink<W> {
    fn publish(&mut self, snapshot: &Snapshot) {
        if self.last.as_ref().is_some_and(|l| same_view(l, snapshot)) {
            return;
        }
        if let Err(e) = self.write(snapshot) {
            tracing::warn!(error = %e, "failed to write snapshot");
        }
        self.last = Some(snapshot.clone());
    }
}
