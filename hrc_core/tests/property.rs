use hrc_core::mocks::{Script, ScriptedApi, readings};
use hrc_core::{Action, Phase, SessionCfg, SessionMachine, SeriesStore, Stream};
use proptest::prelude::*;
use std::time::Duration;

#[derive(Debug, Clone)]
enum Op {
    Act(Action),
    Poll(Stream),
    /// Handle whatever has already completed.
    Pump,
    /// Block briefly for the next completion.
    Wait,
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        Just(Op::Act(Action::Connect)),
        Just(Op::Act(Action::GetBaseline)),
        Just(Op::Act(Action::StartChallenge)),
        Just(Op::Act(Action::Disconnect)),
        Just(Op::Poll(Stream::Baseline)),
        Just(Op::Poll(Stream::Challenge)),
        Just(Op::Pump),
        Just(Op::Wait),
    ]
}

fn expected_timer(m: &SessionMachine<ScriptedApi>) -> Option<Stream> {
    match m.phase() {
        Phase::BaselineRecording if !m.is_challenge_pending() => Some(Stream::Baseline),
        Phase::ChallengeRecording => Some(Stream::Challenge),
        _ => None,
    }
}

fn sample() -> impl Strategy<Value = Option<i32>> {
    prop_oneof![1 => Just(None), 4 => (40i32..200).prop_map(Some)]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn timers_and_scalars_stay_consistent(ops in prop::collection::vec(op(), 1..40)) {
        let api = ScriptedApi::with_script(Script {
            baseline_series: Ok(Some(readings(&[58, 61, 63]))),
            challenge_series: Ok(Some(readings(&[70, 85, 90]))),
            ..Script::default()
        });
        let mut m = SessionMachine::new(
            api,
            SessionCfg { poll_interval: Duration::from_secs(3600), ..SessionCfg::default() },
        );
        for op in ops {
            match op {
                Op::Act(a) => { let _ = m.dispatch(a); }
                Op::Poll(s) => { m.poll_now(s); }
                Op::Pump => { m.pump(); }
                Op::Wait => { m.wait_event(Duration::from_millis(50)); }
            }
            prop_assert!(m.polling().active_count() <= 1);
            prop_assert_eq!(m.polling().active(), expected_timer(&m));
            let st = m.store();
            prop_assert_eq!(st.delta(), st.max() - st.baseline());
            prop_assert!(st.max() >= st.baseline());
        }
        m.disconnect();
        prop_assert_eq!(m.polling().active_count(), 0);
    }

    #[test]
    fn store_delta_tracks_max_minus_baseline(
        base in prop::collection::vec(sample(), 0..30),
        chal in prop::collection::vec(sample(), 0..30),
        scalar in 0i32..150,
        reported in 0i32..220,
    ) {
        let mut st = SeriesStore::new();
        st.replace_baseline(base.clone());
        st.set_baseline_scalar(scalar);
        st.observe_max(reported);
        st.align_challenge_after_baseline();
        st.replace_challenge(chal.clone());

        let seen = base.iter().chain(chal.iter()).flatten().copied().max().unwrap_or(0);
        prop_assert_eq!(st.max(), seen.max(reported).max(scalar));
        prop_assert_eq!(st.delta(), st.max() - st.baseline());
        prop_assert_eq!(st.challenge_series().len(), base.len().saturating_sub(1) + chal.len());
        prop_assert_eq!(st.labels().len(), st.baseline_series().len().max(st.challenge_series().len()));
    }
}
