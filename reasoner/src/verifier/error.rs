//! Errors raised inside the symbolic engine.
//!
//! These never leave [`crate::verifier::verify`]; every variant is read as
//! "not verified".

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SymbolicError {
    #[error("parse error at {position} in {input:?}: {reason}")]
    Parse {
        input: String,
        position: usize,
        reason: String,
    },

    #[error("division by zero")]
    DivisionByZero,

    #[error("unsupported: {0}")]
    Unsupported(String),
}

impl SymbolicError {
    pub fn parse(input: &str, position: usize, reason: impl Into<String>) -> Self {
        Self::Parse {
            input: input.to_string(),
            position,
            reason: reason.into(),
        }
    }

    pub fn unsupported(what: impl Into<String>) -> Self {
        Self::Unsupported(what.into())
    }
}

pub type SymbolicResult<T> = Result<T, SymbolicError>;
