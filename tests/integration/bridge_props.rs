//! Property tests: the bridge keeps its invariants under arbitrary
//! interleavings of input, responses and interrupts

use lisp_session::backends::repl::{
    BridgeError, BridgeEvent, BridgeState, Effect, EvalOutcome, EvalResponse, SessionBridge,
};
use proptest::prelude::*;

#[derive(Debug, Clone)]
enum Op {
    Line { blank: bool },
    Respond { offset: i8, complete: bool, failed: bool },
    Interrupt,
    Lost,
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        4 => any::<bool>().prop_map(|blank| Op::Line { blank }),
        4 => (-1i8..=1, any::<bool>(), any::<bool>())
            .prop_map(|(offset, complete, failed)| Op::Respond { offset, complete, failed }),
        1 => Just(Op::Interrupt),
        1 => Just(Op::Lost),
    ]
}

/// Turn an abstract op into a concrete event against the current bridge
fn event(
    bridge: &SessionBridge,
    op: &Op,
) -> BridgeEvent {
    match op {
        Op::Line { blank: true } => BridgeEvent::LineReady("   ".into()),
        Op::Line { blank: false } => BridgeEvent::LineReady("(x".into()),
        Op::Respond {
            offset,
            complete,
            failed,
        } => {
            let generation = bridge.generation().saturating_add_signed(i64::from(*offset));
            let response = if !complete {
                EvalResponse::incomplete(generation, bridge.pending_lines())
            } else if *failed {
                EvalResponse::finished(generation, EvalOutcome::Failure("boom".into()))
            } else {
                EvalResponse::finished(generation, EvalOutcome::Success("ok".into()))
            };
            BridgeEvent::EvaluatorResponse(response)
        }
        Op::Interrupt => BridgeEvent::Interrupt("SIGINT".into()),
        Op::Lost => BridgeEvent::EvaluatorLost("gone".into()),
    }
}

proptest! {
    #[test]
    fn test_bridge_invariants_hold(ops in prop::collection::vec(op(), 1..60)) {
        let mut bridge = SessionBridge::default();

        for op in &ops {
            let was_evaluating = bridge.is_evaluating();
            let before_generation = bridge.generation();
            let before_pending = bridge.pending().to_string();
            let event = event(&bridge, op);
            let stale = matches!(
                (&event, bridge.state()),
                (BridgeEvent::EvaluatorResponse(r), BridgeState::Evaluating { generation })
                    if r.generation < generation
            );
            let unsolicited =
                matches!(event, BridgeEvent::EvaluatorResponse(_)) && !was_evaluating;
            let is_abort = matches!(event, BridgeEvent::Interrupt(_) | BridgeEvent::EvaluatorLost(_));

            let effects = match bridge.step(event) {
                Ok(effects) => effects,
                Err(BridgeError::Busy) => {
                    // Lines are rejected only while an evaluation is in flight,
                    // and rejection changes nothing.
                    prop_assert!(was_evaluating);
                    prop_assert_eq!(bridge.pending(), before_pending.as_str());
                    continue;
                }
            };

            prop_assert!(bridge.generation() >= before_generation);
            prop_assert_eq!(
                bridge.is_idle(),
                !bridge.is_evaluating() && bridge.pending().is_empty()
            );
            prop_assert_eq!(bridge.pending().lines().count(), bridge.pending_lines());

            if stale || unsolicited {
                prop_assert!(effects.is_empty());
                prop_assert_eq!(bridge.generation(), before_generation);
                prop_assert_eq!(bridge.pending(), before_pending.as_str());
            }

            if is_abort {
                prop_assert_eq!(bridge.generation(), before_generation + 1);
                prop_assert!(bridge.is_idle());
                let expected_reset = Effect::ResetEvaluator {
                    generation: bridge.generation(),
                };
                prop_assert!(effects.contains(&expected_reset));
            }

            match bridge.state() {
                BridgeState::Evaluating { generation } => {
                    prop_assert_eq!(generation, bridge.generation());
                    // Either a fresh dispatch or an ignored response.
                    if !effects.is_empty() {
                        prop_assert_eq!(effects.len(), 1);
                        let dispatched_current = matches!(
                            &effects[0],
                            Effect::Dispatch(request) if request.generation == generation
                        );
                        prop_assert!(dispatched_current);
                    }
                }
                BridgeState::AwaitingLine => {
                    // Whenever the bridge hands control back to the user it
                    // arms exactly one read, last, with the matching prompt.
                    if let Some(last) = effects.last() {
                        prop_assert_eq!(last, &Effect::ReadLine(bridge.prompt().to_string()));
                    }
                    let reads = effects
                        .iter()
                        .filter(|effect| matches!(effect, Effect::ReadLine(_)))
                        .count();
                    prop_assert!(reads <= 1);
                    prop_assert_eq!(
                        bridge.prompt() == ". ",
                        !bridge.pending().is_empty()
                    );
                }
            }
        }
    }
}
