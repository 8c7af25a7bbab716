//! Verifier Module: Deterministic Answer Checks
//!
//! The verifier is the only source of truth for whether a model's final
//! answer is correct. It never calls a model and never raises: anything it
//! cannot prove reads as "not verified".
//!
//! # Layers
//!
//! ```text
//! expr      text → Expr            (tokenizer + precedence parser)
//! algebra   Expr → RationalFunction (exact, arbitrary precision)
//! engine    SymbolicEngine trait    (parses / satisfies / equivalent)
//! symbolic  question + candidate → verified?
//! ```
//!
//! # Usage
//!
//! ```rust
//! use reasoner::verifier::{can_verify, verify};
//!
//! assert!(can_verify("2x = 4"));
//! assert!(verify("2x = 4", "x = 2"));
//! assert!(!verify("3+4*5", "35"));
//! ```

pub mod algebra;
pub mod engine;
pub mod error;
pub mod expr;
pub mod symbolic;

pub use algebra::{Bindings, Polynomial, RationalFunction};
pub use engine::{RationalEngine, SymbolicEngine};
pub use error::{SymbolicError, SymbolicResult};
pub use expr::{parse_expr, Expr, Func};
pub use symbolic::{
    can_verify, choose_unknown, verification_mode, verify, SymbolicVerifier, VerificationMode,
    VerificationOutcome, PREFERRED_UNKNOWNS,
};
