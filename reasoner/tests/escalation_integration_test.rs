//! Integration tests for the Escalation Engine
//!
//! Replays scripted model responses through the full parse → verify →
//! decide → advance flow, without any model or async runtime.

use reasoner::escalation::{
    AttemptRecord, EscalationConfig, EscalationEngine, EscalationState, SolveStage, SolveTier,
    SuggestedAction,
};
use reasoner::{can_verify, parse_model_output, verify, ModelInfo};
use std::collections::VecDeque;

fn answer(final_answer: &str, confidence: f64) -> String {
    format!(
        r#"```json
{{"steps":[{{"title":"Work","explanation":"..."}}],"final_answer":"{final_answer}","difficulty":2,"confidence":{confidence},"topic":"algebra"}}
```"#
    )
}

/// Drive one run to completion. Returns the final state and the accepted answer.
fn replay(
    question: &str,
    config: EscalationConfig,
    responses: &[String],
) -> (EscalationState, String) {
    let engine = EscalationEngine::with_config(config);
    let mut script: VecDeque<&String> = responses.iter().collect();
    let mut state = EscalationState::new(can_verify(question));
    let mut stage = SolveStage::Draft;

    loop {
        let tier = if stage == SolveStage::Escalate {
            SolveTier::Strong
        } else {
            SolveTier::Base
        };
        let raw = script.pop_front().expect("script exhausted");
        let parsed = parse_model_output(raw);
        state.record_attempt(AttemptRecord {
            stage,
            tier,
            model: ModelInfo::new("scripted", tier.to_string()),
            verified: None,
            confidence: parsed.confidence,
            structured: parsed.structured,
        });
        if state.verifiable {
            state.advance(SolveStage::Verify, None).unwrap();
            state.record_verification(verify(question, &parsed.final_answer));
        }

        let decision = engine.decide(&state);
        state
            .advance(decision.next, Some(decision.reason.as_str()))
            .unwrap();
        if decision.action == SuggestedAction::Accept {
            return (state, parsed.final_answer);
        }
        stage = decision.next;
    }
}

/// Test: correct and confident draft is accepted after one call.
#[test]
fn test_correct_draft_single_call() {
    let (state, accepted) = replay("2x = 4", EscalationConfig::default(), &[answer("x = 2", 0.9)]);
    assert_eq!(state.model_calls(), 1);
    assert!(!state.has_retried());
    assert!(!state.has_escalated());
    assert_eq!(accepted, "x = 2");
    assert_eq!(state.summary(), "draft → verify → final");
}

/// Test: wrong, wrong, then strong-correct takes exactly three calls.
#[test]
fn test_wrong_twice_then_strong() {
    let responses = [answer("x = 3", 0.9), answer("x = 5", 0.9), answer("x = 2", 0.8)];
    let (state, accepted) = replay("2x = 4", EscalationConfig::default(), &responses);
    assert_eq!(state.model_calls(), 3);
    assert_eq!(accepted, "x = 2");
    assert_eq!(state.current_tier(), SolveTier::Strong);
    assert_eq!(state.latest().and_then(|a| a.verified), Some(true));
    assert_eq!(
        state.summary(),
        "draft → verify → retry → verify → escalate → verify → final"
    );
}

/// Test: a retry that fixes the answer avoids escalation.
#[test]
fn test_retry_fixes_answer() {
    let responses = [answer("35", 0.9), answer("23", 0.9)];
    let (state, accepted) = replay("3+4*5", EscalationConfig::default(), &responses);
    assert_eq!(accepted, "23");
    assert_eq!(state.model_calls(), 2);
    assert!(state.has_retried());
    assert!(!state.has_escalated());
}

/// Test: unverifiable questions escalate only on low confidence.
#[test]
fn test_unverifiable_confidence_gate() {
    let question = "Prove that the sum of two even numbers is even";
    let (confident, _) = replay(question, EscalationConfig::default(), &[answer("done", 0.9)]);
    assert_eq!(confident.model_calls(), 1);

    let (unsure, _) = replay(
        question,
        EscalationConfig::default(),
        &[answer("done", 0.2), answer("done", 0.9)],
    );
    assert_eq!(unsure.model_calls(), 2);
    assert!(!unsure.has_retried());
    assert_eq!(unsure.summary(), "draft → escalate → final");
}

/// Test: unparseable output has no answer to check, so it is retried.
#[test]
fn test_raw_output_is_retried() {
    let responses = ["I think the answer is two".to_string(), answer("x = 2", 0.9)];
    let (state, accepted) = replay("2x = 4", EscalationConfig::default(), &responses);
    assert!(!state.attempts()[0].structured);
    assert_eq!(state.model_calls(), 2);
    assert_eq!(accepted, "x = 2");
}

/// Test: no run ever exceeds three model calls, even when every answer is wrong.
#[test]
fn test_calls_are_bounded() {
    let wrong: Vec<String> = (0..10).map(|i| answer(&format!("x = {}", i + 10), 0.1)).collect();
    let (state, _) = replay("2x = 4", EscalationConfig::default(), &wrong);
    assert_eq!(state.model_calls(), 3);
    assert!(state.is_terminal());
    assert_eq!(state.latest().and_then(|a| a.verified), Some(false));
}

#[test]
fn test_disabled_escalation_stops_at_retry() {
    let config = EscalationConfig {
        allow_escalation: false,
        ..EscalationConfig::default()
    };
    let wrong = [answer("x = 3", 0.9), answer("x = 5", 0.9), answer("x = 2", 0.9)];
    let (state, accepted) = replay("2x = 4", config, &wrong);
    assert_eq!(state.model_calls(), 2);
    assert_eq!(accepted, "x = 5");
}
