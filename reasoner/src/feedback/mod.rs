//! Model Feedback Module
//!
//! Turns free-text model responses into [`ParsedAttempt`]s the escalation
//! loop can verify and compare.
//!
//! ```text
//! raw text → fenced JSON? → bare JSON? → embedded {..}? → ParsedAttempt
//!                                                  └─ none → raw fallback
//! ```

pub mod model_output;

pub use model_output::{
    parse_model_output, ParsedAttempt, EMPTY_STEP_TEXT, FALLBACK_CONFIDENCE, FALLBACK_DIFFICULTY,
    FALLBACK_STEP_TITLE,
};
