//! Property-based tests for the session state machine
//!
//! These tests verify key invariants hold across arbitrary event sequences.

use super::state::*;
use super::transition::*;
use super::*;
use crate::client::{ClientError, Role, Turn};
use crate::testing::sample_analysis;
use proptest::prelude::*;

// ============================================================================
// Operations
// ============================================================================

#[derive(Debug, Clone)]
enum Op {
    Start,
    Submit(String),
    Reply { end: bool },
    Fail,
    /// Result for a request id that was never issued
    Stray,
    Reset,
    Leave,
}

fn arb_text() -> impl Strategy<Value = String> {
    prop_oneof![
        3 => "[가-힣a-z]{1,12}",
        1 => "[ \t\n]{0,4}",
        1 => " [a-z]{1,5} ",
    ]
}

fn arb_op() -> impl Strategy<Value = Op> {
    prop_oneof![
        1 => Just(Op::Start),
        4 => arb_text().prop_map(Op::Submit),
        3 => any::<bool>().prop_map(|end| Op::Reply { end }),
        2 => Just(Op::Fail),
        1 => Just(Op::Stray),
        1 => Just(Op::Reset),
        1 => Just(Op::Leave),
    ]
}

fn to_event(model: &SessionModel, op: &Op) -> Event {
    let pending = match model.phase {
        SessionPhase::Awaiting { request_id } => request_id,
        // Any id the model has already handed out
        _ => model.next_request_id.saturating_sub(1),
    };
    match op {
        Op::Start => Event::Start,
        Op::Submit(text) => Event::Submit {
            text: text.clone(),
            is_admin: false,
        },
        Op::Reply { end } => Event::ReplyReceived {
            request_id: pending,
            analysis: sample_analysis("응", *end),
        },
        Op::Fail => Event::SendFailed {
            request_id: pending,
            error: ClientError::network(),
        },
        Op::Stray => Event::ReplyReceived {
            request_id: model.next_request_id + 100,
            analysis: sample_analysis("?", false),
        },
        Op::Reset => Event::Reset,
        Op::Leave => Event::Leave,
    }
}

fn count(history: &[Turn], role: Role) -> usize {
    history.iter().filter(|t| t.role == role).count()
}

// ============================================================================
// Properties
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    /// History is never empty and always starts with the seed greeting
    #[test]
    fn prop_history_never_empty(ops in proptest::collection::vec(arb_op(), 0..40)) {
        let mut model = SessionModel::new();
        for op in &ops {
            if let Ok(result) = transition(&model, to_event(&model, op)) {
                model = result.model;
            }
            prop_assert!(!model.history.is_empty());
            prop_assert_eq!(&model.history[0], &Turn::ai(SEED_GREETING));
        }
    }

    /// Rejected events leave the model untouched
    #[test]
    fn prop_rejection_is_noop(ops in proptest::collection::vec(arb_op(), 0..40)) {
        let mut model = SessionModel::new();
        for op in &ops {
            let before = model.clone();
            match transition(&model, to_event(&model, op)) {
                Ok(result) => model = result.model,
                Err(_) => prop_assert_eq!(&model, &before),
            }
        }
    }

    /// Each completed exchange adds exactly two turns, success or failure
    #[test]
    fn prop_exchange_adds_two_turns(
        texts in proptest::collection::vec("[가-힣a-z]{1,10}", 1..10),
        outcomes in proptest::collection::vec(any::<bool>(), 10),
    ) {
        let mut model = transition(&SessionModel::new(), Event::Start).unwrap().model;
        for (text, succeed) in texts.iter().zip(outcomes) {
            let before = model.history.len();
            let sent = transition(&model, Event::Submit { text: text.clone(), is_admin: false }).unwrap();
            model = sent.model;
            prop_assert_eq!(model.history.len(), before + 1);

            let SessionPhase::Awaiting { request_id } = model.phase else {
                return Err(TestCaseError::fail("submit did not start a request"));
            };
            let event = if succeed {
                Event::ReplyReceived { request_id, analysis: sample_analysis("응", false) }
            } else {
                Event::SendFailed { request_id, error: ClientError::network() }
            };
            model = transition(&model, event).unwrap().model;

            prop_assert_eq!(model.history.len(), before + 2);
            prop_assert_eq!(model.history.last().map(|t| t.role), Some(Role::Ai));
            prop_assert!(!model.is_loading());
            prop_assert_eq!(model.phase, SessionPhase::Active);
        }
    }

    /// Outside a pending request there is one AI turn per user turn plus the seed
    #[test]
    fn prop_turns_pair_up(ops in proptest::collection::vec(arb_op(), 0..40)) {
        let mut model = SessionModel::new();
        for op in &ops {
            if let Ok(result) = transition(&model, to_event(&model, op)) {
                model = result.model;
            }
            let users = count(&model.history, Role::User);
            let ais = count(&model.history, Role::Ai);
            if model.is_loading() {
                prop_assert_eq!(ais, users);
            } else {
                prop_assert_eq!(ais, users + 1);
            }
        }
    }

    /// Once ended, nothing but reset or leave changes the session
    #[test]
    fn prop_end_is_terminal(ops in proptest::collection::vec(arb_op(), 0..30)) {
        let mut model = transition(&SessionModel::new(), Event::Start).unwrap().model;
        model = transition(&model, Event::Submit { text: "고마워".to_string(), is_admin: false }).unwrap().model;
        let SessionPhase::Awaiting { request_id } = model.phase else {
            return Err(TestCaseError::fail("submit did not start a request"));
        };
        model = transition(&model, Event::ReplyReceived { request_id, analysis: sample_analysis("끝", true) })
            .unwrap()
            .model;
        prop_assert!(model.is_ended());

        for op in &ops {
            let event = to_event(&model, op);
            let resets = matches!(event, Event::Reset | Event::Leave);
            let before = model.clone();
            if let Ok(result) = transition(&model, event) {
                model = result.model;
            }
            if resets {
                break;
            }
            prop_assert!(model.is_ended());
            prop_assert_eq!(&model.history, &before.history);
        }
    }

    /// Reset always restores exactly the seed
    #[test]
    fn prop_reset_restores_seed(ops in proptest::collection::vec(arb_op(), 0..40)) {
        let mut model = SessionModel::new();
        for op in &ops {
            if let Ok(result) = transition(&model, to_event(&model, op)) {
                model = result.model;
            }
        }
        let reset = transition(&model, Event::Reset).unwrap().model;
        prop_assert_eq!(&reset.history, &seed_history());
        prop_assert!(reset.analysis.is_none());
        prop_assert!(reset.error.is_none());
        prop_assert!(!reset.is_loading());
        prop_assert!(!reset.is_ended());
    }

    /// can_send is false for blank text and while a request is pending
    #[test]
    fn prop_can_send(text in ".{0,20}", pending in any::<bool>()) {
        let mut model = transition(&SessionModel::new(), Event::Start).unwrap().model;
        if pending {
            model = transition(&model, Event::Submit { text: "x".to_string(), is_admin: false }).unwrap().model;
        }
        let expected = !text.trim().is_empty() && !pending;
        prop_assert_eq!(model.can_send(&text), expected);
    }
}
