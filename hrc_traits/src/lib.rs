//! Boundary traits and wire types shared by the kiosk client crates.
//!
//! `HeartRateApi` is the contract of the remote heart-rate service. Both the
//! HTTP implementation and the in-process simulator in `hrc_client` satisfy
//! it, and `hrc_core` only ever talks to the service through it.
pub mod clock;

pub use clock::{Clock, MonotonicClock};

use serde::{Deserialize, Serialize};

/// Heart rate in beats per minute.
pub type Bpm = i32;

/// One polled reading; `None` marks a gap.
pub type Sample = Option<Bpm>;

/// Error type used at the trait boundary.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Reply to `connect`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectReply {
    pub message: String,
    pub error: String,
}

/// Scalar snapshot returned by `start_baseline` and `disconnect`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScalarReply {
    pub message: String,
    pub baseline: Bpm,
    pub max: Bpm,
    pub delta: Bpm,
    pub error: String,
}

/// Reply to `start_challenge`; recording starts without immediate data.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChallengeReply {
    pub error: String,
}

/// Full series recorded so far for one phase. `None` when the service has
/// nothing yet (it answers with JSON `null`).
pub type SeriesReply = Option<Vec<Sample>>;

/// Remote heart-rate service.
///
/// Calls take `&self` because polling reads may overlap with each other and
/// with state-changing calls. Series reads are idempotent and always return
/// the complete series, never an increment.
pub trait HeartRateApi: Send + Sync {
    fn connect(&self) -> Result<ConnectReply, BoxError>;
    fn start_baseline(&self) -> Result<ScalarReply, BoxError>;
    fn start_challenge(&self) -> Result<ChallengeReply, BoxError>;
    fn disconnect(&self) -> Result<ScalarReply, BoxError>;
    fn fetch_baseline_series(&self) -> Result<SeriesReply, BoxError>;
    fn fetch_challenge_series(&self) -> Result<SeriesReply, BoxError>;
}

impl<T: HeartRateApi + ?Sized> HeartRateApi for Box<T> {
    fn connect(&self) -> Result<ConnectReply, BoxError> {
        (**self).connect()
    }
    fn start_baseline(&self) -> Result<ScalarReply, BoxError> {
        (**self).start_baseline()
    }
    fn start_challenge(&self) -> Result<ChallengeReply, BoxError> {
        (**self).start_challenge()
    }
    fn disconnect(&self) -> Result<ScalarReply, BoxError> {
        (**self).disconnect()
    }
    fn fetch_baseline_series(&self) -> Result<SeriesReply, BoxError> {
        (**self).fetch_baseline_series()
    }
    fn fetch_challenge_series(&self) -> Result<SeriesReply, BoxError> {
        (**self).fetch_challenge_series()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn scalar_reply_tolerates_missing_fields() {
        let r: ScalarReply = serde_json::from_str(r#"{"message":"baseline","baseline":61}"#).unwrap();
        assert_eq!(r.baseline, 61);
        assert_eq!(r.max, 0);
        assert!(r.error.is_empty());
    }

    #[rstest]
    #[case("null", None)]
    #[case("[]", Some(vec![]))]
    #[case("[65,null,70]", Some(vec![Some(65), None, Some(70)]))]
    fn series_reply_decodes(#[case] body: &str, #[case] expected: SeriesReply) {
        let got: SeriesReply = serde_json::from_str(body).unwrap();
        assert_eq!(got, expected);
    }
}
