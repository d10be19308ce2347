//! `From` implementations bridging `hrc_config` types to `hrc_core` types.

use crate::config::{ScriptCfg, SessionCfg};
use std::time::Duration;

// ── SessionCfg ───────────────────────────────────────────────────────────────

impl From<&hrc_config::Config> for SessionCfg {
    fn from(c: &hrc_config::Config) -> Self {
        Self {
            poll_interval: Duration::from_millis(c.polling.interval_ms),
            clear_series_on_finish: c.session.clear_series_on_finish,
        }
    }
}

// ── ScriptCfg ────────────────────────────────────────────────────────────────

impl From<&hrc_config::SessionCfg> for ScriptCfg {
    fn from(c: &hrc_config::SessionCfg) -> Self {
        Self {
            step_timeout: Duration::from_millis(c.step_timeout_ms),
            challenge_for: Duration::from_millis(c.challenge_ms),
        }
    }
}
