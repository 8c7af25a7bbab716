//! Symbolic engine seam.
//!
//! The verifier only needs three questions answered about text. Keeping them
//! behind [`SymbolicEngine`] lets a heavier computer-algebra backend replace
//! [`RationalEngine`] without touching verification policy.

use crate::verifier::algebra::{Bindings, RationalFunction};
use crate::verifier::error::SymbolicResult;
use crate::verifier::expr::parse_expr;

pub trait SymbolicEngine: Send + Sync {
    /// Whether `text` parses as a single expression.
    fn parses(&self, text: &str) -> bool;

    /// Substitute `value` for `unknown` on both sides and report whether
    /// `lhs - rhs` simplifies to exactly zero.
    fn satisfies(&self, lhs: &str, rhs: &str, unknown: &str, value: &str) -> SymbolicResult<bool>;

    /// Whether `expression - candidate` simplifies to exactly zero.
    fn equivalent(&self, expression: &str, candidate: &str) -> SymbolicResult<bool>;
}

/// Exact engine over multivariate rational functions with rational coefficients.
#[derive(Debug, Clone, Copy, Default)]
pub struct RationalEngine;

impl RationalEngine {
    fn evaluate(text: &str, bindings: &Bindings) -> SymbolicResult<RationalFunction> {
        parse_expr(text)?.evaluate(bindings)
    }
}

impl SymbolicEngine for RationalEngine {
    fn parses(&self, text: &str) -> bool {
        parse_expr(text).is_ok()
    }

    fn satisfies(&self, lhs: &str, rhs: &str, unknown: &str, value: &str) -> SymbolicResult<bool> {
        let value = Self::evaluate(value, &Bindings::new())?;
        let mut bindings = Bindings::new();
        bindings.insert(unknown.to_string(), value);
        let left = Self::evaluate(lhs, &bindings)?;
        let right = Self::evaluate(rhs, &bindings)?;
        Ok(left.sub(&right)?.is_zero())
    }

    fn equivalent(&self, expression: &str, candidate: &str) -> SymbolicResult<bool> {
        let empty = Bindings::new();
        let left = Self::evaluate(expression, &empty)?;
        let right = Self::evaluate(candidate, &empty)?;
        Ok(left.sub(&right)?.is_zero())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::verifier::error::SymbolicError;

    #[test]
    fn test_satisfies_linear_and_quadratic() {
        let engine = RationalEngine;
        assert!(engine.satisfies("2x", "4", "x", "2").unwrap());
        assert!(!engine.satisfies("2x", "4", "x", "3").unwrap());
        assert!(engine.satisfies("x^2 - 5x + 6", "0", "x", "3").unwrap());
        assert!(engine.satisfies("3y + 1", "2", "y", "1/3").unwrap());
    }

    #[test]
    fn test_satisfies_leaves_other_symbols_free() {
        // y is unbound, so x = 2 only satisfies if y cancels.
        let engine = RationalEngine;
        assert!(engine.satisfies("x + y", "2 + y", "x", "2").unwrap());
        assert!(!engine.satisfies("x + y", "2", "x", "2").unwrap());
    }

    #[test]
    fn test_pole_is_an_error() {
        let engine = RationalEngine;
        let err = engine.satisfies("1/(x - 2)", "1", "x", "2").unwrap_err();
        assert_eq!(err, SymbolicError::DivisionByZero);
    }

    #[test]
    fn test_equivalent() {
        let engine = RationalEngine;
        assert!(engine.equivalent("3+4*5", "23").unwrap());
        assert!(engine.equivalent("1/2 + 1/4", "0.75").unwrap());
        assert!(!engine.equivalent("3+4*5", "35").unwrap());
        assert!(engine.equivalent("2+2", "abc").is_ok());
        assert!(!engine.equivalent("2+2", "abc").unwrap());
        assert!(engine.equivalent("2+2", "4 apples").is_ok());
    }

    #[test]
    fn test_parses() {
        let engine = RationalEngine;
        assert!(engine.parses("2(x+1)"));
        assert!(!engine.parses("2 +"));
        assert!(!engine.parses(""));
    }
}
