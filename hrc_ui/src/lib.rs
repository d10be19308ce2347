#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
//! Presentation for session snapshots: a text panel for terminals and
//! chart data for an external chart widget.

pub mod chart;
pub mod panel;
pub mod sink;

pub use chart::{ChartData, Dataset, sparkline};
pub use panel::{DeltaStyle, render_panel};
pub use sink::TerminalSink;
