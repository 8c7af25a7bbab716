//! Answer verification against the question.
//!
//! Two shapes of question can be checked:
//!
//! - **Equation**: the question contains `=` and does not end in `?`. The
//!   candidate's value for the unknown is substituted into both sides and
//!   the difference must simplify to zero.
//! - **Expression**: the question is pure arithmetic. The candidate must
//!   simplify to the same value.
//!
//! Anything else is unverifiable. Verification never fails loudly: parse
//! errors, poles and unsupported constructs all read as "not verified".

use crate::router::task_classifier::{is_arithmetic_only, strip_command};
use crate::verifier::engine::{RationalEngine, SymbolicEngine};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

/// Unknowns tried in order when reading an equation.
pub const PREFERRED_UNKNOWNS: &[char] = &['x', 'y', 'z', 'a', 'b', 't', 'u', 'v', 'w'];

const DEFAULT_UNKNOWN: char = 'x';

/// `<unknown> = value` for each preferred unknown.
static ASSIGNMENTS: LazyLock<Vec<(char, Regex)>> = LazyLock::new(|| {
    PREFERRED_UNKNOWNS
        .iter()
        .map(|&unknown| {
            let pattern = format!(r"(?:^|[^A-Za-z0-9_]){unknown}\s*=\s*([^,;\n]+)");
            (unknown, Regex::new(&pattern).unwrap())
        })
        .collect()
});

fn assignment_pattern(unknown: char) -> Option<&'static Regex> {
    ASSIGNMENTS
        .iter()
        .find(|(name, _)| *name == unknown)
        .map(|(_, re)| re)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerificationMode {
    Equation,
    Expression,
}

/// Which check applies to `question`, if any.
pub fn verification_mode(question: &str) -> Option<VerificationMode> {
    let trimmed = question.trim();
    if trimmed.contains('=') && !trimmed.ends_with('?') {
        return Some(VerificationMode::Equation);
    }
    if is_arithmetic_only(&strip_command(trimmed)) {
        return Some(VerificationMode::Expression);
    }
    None
}

pub fn can_verify(question: &str) -> bool {
    verification_mode(question).is_some()
}

/// First preferred unknown letter present in `text`, defaulting to `x`.
pub fn choose_unknown(text: &str) -> char {
    PREFERRED_UNKNOWNS
        .iter()
        .copied()
        .find(|c| text.contains(*c))
        .unwrap_or(DEFAULT_UNKNOWN)
}

/// Split an equation question into its two sides, dropping the solve
/// command and any instruction prefix ending in `:`.
fn equation_sides(question: &str) -> Option<(String, String)> {
    let body = strip_command(question);
    let (lhs, rhs) = body.split_once('=')?;
    let lhs = match lhs.rsplit_once(':') {
        Some((_, tail)) => tail,
        None => lhs,
    };
    Some((lhs.trim().to_string(), rhs.trim().to_string()))
}

/// Detailed result of one verification attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerificationOutcome {
    pub mode: Option<VerificationMode>,
    pub verified: bool,
    /// Unknown solved for, in equation mode.
    pub unknown: Option<char>,
    /// The value that was substituted or compared.
    pub value: Option<String>,
    /// Why verification failed, when it did.
    pub error: Option<String>,
}

impl VerificationOutcome {
    fn unverifiable() -> Self {
        Self {
            mode: None,
            verified: false,
            unknown: None,
            value: None,
            error: None,
        }
    }
}

/// Verifier parameterised over its symbolic backend.
#[derive(Debug, Clone, Default)]
pub struct SymbolicVerifier<E = RationalEngine> {
    engine: E,
}

impl SymbolicVerifier<RationalEngine> {
    pub fn new() -> Self {
        Self::default()
    }
}

impl<E: SymbolicEngine> SymbolicVerifier<E> {
    pub fn with_engine(engine: E) -> Self {
        Self { engine }
    }

    pub fn can_verify(&self, question: &str) -> bool {
        can_verify(question)
    }

    /// True only when the candidate is proven correct.
    pub fn verify(&self, question: &str, candidate: &str) -> bool {
        let outcome = self.check(question, candidate);
        if let Some(err) = &outcome.error {
            tracing::debug!(mode = ?outcome.mode, error = %err, "verification failed");
        }
        outcome.verified
    }

    pub fn check(&self, question: &str, candidate: &str) -> VerificationOutcome {
        match verification_mode(question) {
            Some(VerificationMode::Equation) => self.check_equation(question, candidate),
            Some(VerificationMode::Expression) => self.check_expression(question, candidate),
            None => VerificationOutcome::unverifiable(),
        }
    }

    fn check_equation(&self, question: &str, candidate: &str) -> VerificationOutcome {
        let mut outcome = VerificationOutcome {
            mode: Some(VerificationMode::Equation),
            ..VerificationOutcome::unverifiable()
        };
        let Some((lhs, rhs)) = equation_sides(question) else {
            outcome.error = Some("no '=' in equation".to_string());
            return outcome;
        };
        let unknown = choose_unknown(&format!("{lhs}={rhs}"));
        outcome.unknown = Some(unknown);

        let Some(value) = self.candidate_value(candidate, unknown) else {
            outcome.error = Some(format!("no value for {unknown} in {candidate:?}"));
            return outcome;
        };
        outcome.value = Some(value.clone());

        match self
            .engine
            .satisfies(&lhs, &rhs, &unknown.to_string(), &value)
        {
            Ok(verified) => outcome.verified = verified,
            Err(err) => outcome.error = Some(err.to_string()),
        }
        outcome
    }

    /// The value a candidate assigns to `unknown`.
    ///
    /// Tried in order: the whole candidate, an `unknown = value` assignment
    /// anywhere in it, then whatever follows its first `=`.
    fn candidate_value(&self, candidate: &str, unknown: char) -> Option<String> {
        let whole = candidate.trim();
        if self.engine.parses(whole) {
            return Some(whole.to_string());
        }

        if let Some(caps) = assignment_pattern(unknown).and_then(|re| re.captures(whole)) {
            let value = caps[1].trim().trim_end_matches('.').trim();
            if !value.is_empty() {
                return Some(value.to_string());
            }
        }

        whole
            .split_once('=')
            .map(|(_, rest)| rest.trim().to_string())
            .filter(|rest| !rest.is_empty())
    }

    fn check_expression(&self, question: &str, candidate: &str) -> VerificationOutcome {
        let expression = strip_command(question);
        let value = match candidate.split_once('=') {
            Some((_, rest)) => rest.trim(),
            None => candidate.trim(),
        };
        let mut outcome = VerificationOutcome {
            mode: Some(VerificationMode::Expression),
            value: Some(value.to_string()),
            ..VerificationOutcome::unverifiable()
        };
        match self.engine.equivalent(&expression, value) {
            Ok(verified) => outcome.verified = verified,
            Err(err) => outcome.error = Some(err.to_string()),
        }
        outcome
    }
}

/// Verify with the default exact engine.
pub fn verify(question: &str, candidate: &str) -> bool {
    SymbolicVerifier::new().verify(question, candidate)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_can_verify() {
        assert!(can_verify("2x = 4"));
        assert!(can_verify("3+4*5"));
        assert!(can_verify("solve 3 + 4"));
        assert!(can_verify("1.5 * 2"));
        assert!(!can_verify("What is x if 2x = 4?"));
        assert!(!can_verify("Prove that sqrt(2) is irrational"));
    }

    #[test]
    fn test_choose_unknown() {
        assert_eq!(choose_unknown("2y + 1 = 5"), 'y');
        assert_eq!(choose_unknown("x + y = 3"), 'x');
        assert_eq!(choose_unknown("3t = 9"), 't');
        assert_eq!(choose_unknown("2 = 2"), 'x');
    }

    #[test]
    fn test_equation_candidates() {
        assert!(verify("2x = 4", "2"));
        assert!(verify("2x = 4", "x = 2"));
        assert!(verify("2x = 4", "The answer is x = 2."));
        assert!(verify("solve: 3y + 1 = 7", "y=2"));
        assert!(!verify("2x = 4", "3"));
        assert!(!verify("2x = 4", ""));
        assert!(!verify("2x = 4", "two"));
    }

    #[test]
    fn test_instruction_prefix_is_dropped() {
        assert!(verify("Solve for x: 5x - 10 = 0", "2"));
    }

    #[test]
    fn test_quadratic_root() {
        assert!(verify("x^2 - 5x + 6 = 0", "x = 3"));
        assert!(verify("x^2 - 5x + 6 = 0", "2"));
        assert!(!verify("x^2 - 5x + 6 = 0", "4"));
    }

    #[test]
    fn test_expression_candidates() {
        assert!(verify("3+4*5", "23"));
        assert!(verify("3+4*5", "3+4*5 = 23"));
        assert!(verify("1/3 + 1/6", "0.5"));
        assert!(!verify("3+4*5", "35"));
        assert!(!verify("3+4*5", "twenty-three"));
    }

    #[test]
    fn test_unverifiable_question() {
        let outcome = SymbolicVerifier::new().check("What is 2+2?", "4");
        assert_eq!(outcome.mode, None);
        assert!(!outcome.verified);
    }

    #[test]
    fn test_pole_is_not_verified() {
        let outcome = SymbolicVerifier::new().check("1/(x-2) = 1", "2");
        assert_eq!(outcome.mode, Some(VerificationMode::Equation));
        assert!(!outcome.verified);
        assert!(outcome.error.is_some());
    }

    #[test]
    fn test_verify_is_deterministic() {
        let first = SymbolicVerifier::new().check("x^2 = 9", "x = -3");
        let second = SymbolicVerifier::new().check("x^2 = 9", "x = -3");
        assert_eq!(first, second);
        assert!(first.verified);
    }

    #[test]
    fn test_assignment_for_every_unknown() {
        for &unknown in PREFERRED_UNKNOWNS {
            assert!(assignment_pattern(unknown).is_some(), "no pattern for {unknown}");
        }
        assert!(verify("x + 1 = 3", "y = 3, x = 2"));
        assert!(verify("3b = 6", "so b = 2."));
        assert!(!verify("x + 1 = 3", "y = 2, x = 5"));
    }

    #[test]
    fn test_oversized_powers_fail_closed() {
        let verifier = SymbolicVerifier::new();
        for question in ["2^(-9223372036854775808)", "(((2^64)^64)^64)^64"] {
            let outcome = verifier.check(question, "1");
            assert_eq!(outcome.mode, Some(VerificationMode::Expression));
            assert!(!outcome.verified, "{question} verified");
            assert!(outcome.error.is_some());
        }
    }
}
