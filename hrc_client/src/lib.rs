//! Backends for the heart-rate service.
//!
//! - `HttpMonitor` (feature `http`): the real service over HTTP/JSON.
//! - `SimulatedMonitor`: an in-process stand-in with the same observable
//!   behavior, used for demos and tests.
pub mod error;
#[cfg(feature = "http")]
pub mod http;
pub mod sim;

pub use error::ClientError;
#[cfg(feature = "http")]
pub use http::HttpMonitor;
pub use sim::{SimProfile, SimulatedMonitor};
