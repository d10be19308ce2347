//! Session phases and the user actions that move between them.

use serde::Serialize;
use std::fmt;

/// Exactly one phase is active at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    #[default]
    Disconnected,
    Connected,
    BaselineRecording,
    ChallengeRecording,
}

impl Phase {
    /// Whether `action` may be issued from this phase.
    pub fn accepts(self, action: Action) -> bool {
        match action {
            Action::Connect | Action::Disconnect => true,
            Action::GetBaseline => {
                matches!(self, Phase::Connected | Phase::BaselineRecording)
            }
            Action::StartChallenge => matches!(self, Phase::BaselineRecording),
        }
    }

    pub fn is_recording(self) -> bool {
        matches!(self, Phase::BaselineRecording | Phase::ChallengeRecording)
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Phase::Disconnected => "disconnected",
            Phase::Connected => "connected",
            Phase::BaselineRecording => "recording baseline",
            Phase::ChallengeRecording => "recording challenge",
        })
    }
}

/// User-triggered events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    Connect,
    GetBaseline,
    StartChallenge,
    /// "Finish" on the kiosk.
    Disconnect,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Action::Connect => "connect",
            Action::GetBaseline => "record baseline",
            Action::StartChallenge => "start challenge",
            Action::Disconnect => "finish",
        })
    }
}

impl std::str::FromStr for Action {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "connect" | "c" => Ok(Action::Connect),
            "baseline" | "b" => Ok(Action::GetBaseline),
            "challenge" | "start" | "s" => Ok(Action::StartChallenge),
            "finish" | "disconnect" | "f" => Ok(Action::Disconnect),
            other => Err(format!("unknown action {other:?}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(Phase::Disconnected, Action::GetBaseline, false)]
    #[case(Phase::Connected, Action::GetBaseline, true)]
    #[case(Phase::BaselineRecording, Action::GetBaseline, true)]
    #[case(Phase::ChallengeRecording, Action::GetBaseline, false)]
    #[case(Phase::Connected, Action::StartChallenge, false)]
    #[case(Phase::BaselineRecording, Action::StartChallenge, true)]
    #[case(Phase::ChallengeRecording, Action::StartChallenge, false)]
    #[case(Phase::ChallengeRecording, Action::Disconnect, true)]
    #[case(Phase::Disconnected, Action::Disconnect, true)]
    #[case(Phase::ChallengeRecording, Action::Connect, true)]
    fn transition_table(#[case] phase: Phase, #[case] action: Action, #[case] ok: bool) {
        assert_eq!(phase.accepts(action), ok);
    }

    #[test]
    fn parses_kiosk_words() {
        assert_eq!("Finish".parse::<Action>(), Ok(Action::Disconnect));
        assert_eq!(" baseline ".parse::<Action>(), Ok(Action::GetBaseline));
        assert!("dance".parse::<Action>().is_err());
    }
}
