//! Integration tests for the Verifier module
//!
//! Drives the public verifier API with questions and candidate answers the
//! way the orchestrator does: classify, check verifiability, then verify.

use reasoner::verifier::{
    can_verify, verify, RationalEngine, SymbolicEngine, SymbolicResult, SymbolicVerifier,
    VerificationMode,
};
use reasoner::{classify, Task};

/// Test: every linear equation with a unique root accepts that root and
/// rejects a neighbour.
#[test]
fn test_linear_equations_accept_only_the_root() {
    let cases = [
        ("2x=4", "2"),
        ("2x+1=5", "2"),
        ("3y - 7 = 2", "3"),
        ("5z = 2z + 9", "3"),
        ("0.5a + 1 = 2", "2"),
        ("(x + 1)/3 = 2", "5"),
        ("7 = 2b + 1", "3"),
        ("4t = 1", "1/4"),
    ];
    for (question, root) in cases {
        assert!(can_verify(question), "{question} should be verifiable");
        assert!(verify(question, root), "{question} with {root}");
        let wrong = format!("{root} + 1");
        assert!(!verify(question, &wrong), "{question} with {wrong}");
    }
}

#[test]
fn test_documented_equation_examples() {
    assert!(verify("2x=4", "x=2"));
    assert!(!verify("2x=4", "x=3"));
}

/// Test: answers phrased the way models phrase them still verify.
#[test]
fn test_candidate_phrasings() {
    let question = "Solve 2x + 1 = 5";
    for candidate in ["2", "x = 2", "x=2", "So x = 2.", "x = 4/2", "2.0"] {
        assert!(verify(question, candidate), "candidate {candidate:?}");
    }
    for candidate in ["", "x = 3", "no solution", "x = sqrt(2)"] {
        assert!(!verify(question, candidate), "candidate {candidate:?}");
    }
}

#[test]
fn test_arithmetic_expressions() {
    assert!(verify("3+4*5", "23"));
    assert!(verify("3+4*5", "3 + 4*5 = 23"));
    assert!(verify("(1+2)^3 / 9", "3"));
    assert!(verify("1/3 + 1/3 + 1/3", "1"));
    assert!(!verify("1/3", "0.333"));
    assert!(!verify("2^10", "1000"));
}

/// Test: anything the engine cannot handle fails closed.
#[test]
fn test_failures_are_not_verified() {
    assert!(!verify("1/(x-1) = 2", "1"));
    assert!(!verify("x^2 = 2", "sqrt(2)"));
    assert!(!verify("sin(x) = 0", "0"));
    assert!(!verify("What is 2+2?", "4"));
    assert!(!verify("2x = 4", "\\frac{4}{2}"));
}

#[test]
fn test_verifiability_tracks_classification() {
    assert!(can_verify("2x+1=5"));
    assert_eq!(classify("2x+1=5").0, Task::SolveEquation);
    assert!(can_verify("3+4*5"));
    assert_eq!(classify("3+4*5").0, Task::Evaluate);
    assert!(!can_verify("differentiate x^2"));
    assert!(!can_verify("Is x = 2 a root?"));
}

/// Engine that claims every equation holds, to show the verifier defers to
/// whichever backend it is given.
struct AlwaysTrue;

impl SymbolicEngine for AlwaysTrue {
    fn parses(&self, _text: &str) -> bool {
        true
    }

    fn satisfies(&self, _: &str, _: &str, _: &str, _: &str) -> SymbolicResult<bool> {
        Ok(true)
    }

    fn equivalent(&self, _: &str, _: &str) -> SymbolicResult<bool> {
        Ok(true)
    }
}

#[test]
fn test_custom_engine_is_used() {
    let permissive = SymbolicVerifier::with_engine(AlwaysTrue);
    assert!(permissive.verify("2x = 4", "banana"));
    assert!(!permissive.verify("What is 2+2?", "4"));

    let exact = SymbolicVerifier::with_engine(RationalEngine);
    assert!(!exact.verify("2x = 4", "banana"));
}

#[test]
fn test_outcome_reports_unknown_and_value() {
    let outcome = SymbolicVerifier::new().check("3y + 1 = 10", "The answer: y = 3.");
    assert_eq!(outcome.mode, Some(VerificationMode::Equation));
    assert_eq!(outcome.unknown, Some('y'));
    assert_eq!(outcome.value.as_deref(), Some("3"));
    assert!(outcome.verified);
}
