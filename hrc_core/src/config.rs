//! Runtime configuration for the session machine and runners.
//!
//! These are the structs `hrc_core` works with. They are separate from the
//! TOML-deserialized config in `hrc_config`; see `conversions`.

use std::time::Duration;

/// Session machine settings.
#[derive(Debug, Clone)]
pub struct SessionCfg {
    /// Period of both series polls.
    pub poll_interval: Duration,
    /// Drop both series when a session is finished instead of at the next connect.
    pub clear_series_on_finish: bool,
}

impl Default for SessionCfg {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(1000),
            clear_series_on_finish: false,
        }
    }
}

/// Scripted runner settings.
#[derive(Debug, Clone)]
pub struct ScriptCfg {
    /// Upper bound on waiting for each step's reply.
    pub step_timeout: Duration,
    /// How long the challenge phase records before finishing.
    pub challenge_for: Duration,
}

impl Default for ScriptCfg {
    fn default() -> Self {
        Self {
            step_timeout: Duration::from_secs(15),
            challenge_for: Duration::from_secs(30),
        }
    }
}
