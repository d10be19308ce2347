//! HTTP/JSON implementation of `HeartRateApi`.

use crate::error::{ClientError, Result};
use hrc_traits::{
    BoxError, ChallengeReply, ConnectReply, HeartRateApi, ScalarReply, SeriesReply,
};
use serde::de::DeserializeOwned;
use std::time::Duration;

pub const PATH_CONNECT: &str = "connect";
pub const PATH_BASELINE: &str = "baseline";
pub const PATH_CHALLENGE: &str = "challenge";
pub const PATH_DISCONNECT: &str = "disconnect";
pub const PATH_BASELINE_SERIES: &str = "heart-rate-data-baseline";
pub const PATH_CHALLENGE_SERIES: &str = "heart-rate-data-challenge";

/// Talks to the heart-rate service with plain GET requests.
#[derive(Debug, Clone)]
pub struct HttpMonitor {
    agent: ureq::Agent,
    base_url: String,
}

impl HttpMonitor {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Self {
        let agent = ureq::AgentBuilder::new().timeout(timeout).build();
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { agent, base_url }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn url_for(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = self.url_for(path);
        tracing::trace!(%url, "GET");
        match self.agent.get(&url).call() {
            Ok(resp) => {
                let body = resp.into_string()?;
                decode(path, &body)
            }
            // The service reports failures as 500 with a regular `{error}` body;
            // keep that body so the caller sees the remote message.
            Err(ureq::Error::Status(code, resp)) => {
                let body = resp.into_string().unwrap_or_default();
                match serde_json::from_str::<T>(&body) {
                    Ok(v) => {
                        tracing::debug!(code, path, "error status with decodable body");
                        Ok(v)
                    }
                    Err(_) => Err(ClientError::Status { code, body }),
                }
            }
            Err(ureq::Error::Transport(t)) => {
                tracing::warn!(%url, error = %t, "transport failure");
                Err(ClientError::Transport(t.to_string()))
            }
        }
    }
}

fn decode<T: DeserializeOwned>(path: &str, body: &str) -> Result<T> {
    serde_json::from_str(body).map_err(|e| ClientError::Decode {
        path: path.to_string(),
        reason: e.to_string(),
    })
}

impl HeartRateApi for HttpMonitor {
    fn connect(&self) -> std::result::Result<ConnectReply, BoxError> {
        Ok(self.get(PATH_CONNECT)?)
    }

    fn start_baseline(&self) -> std::result::Result<ScalarReply, BoxError> {
        Ok(self.get(PATH_BASELINE)?)
    }

    fn start_challenge(&self) -> std::result::Result<ChallengeReply, BoxError> {
        Ok(self.get(PATH_CHALLENGE)?)
    }

    fn disconnect(&self) -> std::result::Result<ScalarReply, BoxError> {
        Ok(self.get(PATH_DISCONNECT)?)
    }

    fn fetch_baseline_series(&self) -> std::result::Result<SeriesReply, BoxError> {
        Ok(self.get(PATH_BASELINE_SERIES)?)
    }

    fn fetch_challenge_series(&self) -> std::result::Result<SeriesReply, BoxError> {
        Ok(self.get(PATH_CHALLENGE_SERIES)?)
    }
}
