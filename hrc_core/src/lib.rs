#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
//! Session logic for the heart-rate challenge kiosk (backend-agnostic).
//!
//! All service interaction goes through `hrc_traits::HeartRateApi`.
//!
//! ## Architecture
//!
//! - **Phases**: `Phase` and the `Action`s that move between them (`phase`)
//! - **Series**: `SeriesStore` holds both series and derives baseline/max/delta
//! - **Polling**: `PollingController` owns the two periodic timers (`poller`)
//! - **Machine**: `SessionMachine` applies actions and completed calls in order,
//!   dropping stale completions by session epoch (`machine`)
//! - **Snapshots**: view-state pushed to `SnapshotSink`s after every mutation
//! - **Runners**: scripted and channel-driven drivers (`runner`)
//!
//! Scalars follow one rule everywhere: `delta == max - baseline`.

pub mod client_error;
pub mod config;
pub mod conversions;
pub mod error;
pub mod machine;
pub mod mocks;
pub mod phase;
pub mod poller;
pub mod runner;
pub mod series;
pub mod snapshot;

pub use client_error::map_client_error;
pub use config::{ScriptCfg, SessionCfg};
pub use error::{CallError, Report, Result, SessionError};
pub use machine::{Disposition, Event, Reply, SessionMachine};
pub use phase::{Action, Phase};
pub use poller::{Poller, PollingController, Stream};
pub use runner::{drive, run_scripted};
pub use series::{SeriesStore, series_max};
pub use snapshot::{SessionResult, Snapshot, SnapshotSink};
