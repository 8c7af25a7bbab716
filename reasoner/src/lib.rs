//! Reasoner Library
//!
//! The deterministic core of the math solver. Nothing in this crate performs
//! I/O or calls a model; every function is pure given its inputs.
//!
//! # Components
//!
//! - [`router`]: input gates, answer-option extraction, task classification
//! - [`verifier`]: exact symbolic verification of candidate answers
//! - [`feedback`]: lenient parsing of model responses into attempts
//! - [`escalation`]: stage graph and retry/escalate/accept decisions
//!
//! # Usage
//!
//! ```rust
//! use reasoner::{classify, verify, Task};
//!
//! let (task, _meta) = classify("2x + 1 = 5");
//! assert_eq!(task, Task::SolveEquation);
//! assert!(verify("2x + 1 = 5", "x = 2"));
//! ```

pub mod escalation;
pub mod feedback;
pub mod ir;
pub mod router;
pub mod verifier;

// Re-export IR and result records
pub use ir::{ClassifiedProblem, ModelInfo, ProblemIr, SolveResult, Step, Task};

// Re-export routing types
pub use router::{
    check_input, classify, classify_problem, extract_options, route, InputRejection, TaskMeta,
};

// Re-export verifier types
pub use verifier::{can_verify, verify, SymbolicEngine, SymbolicVerifier, VerificationOutcome};

// Re-export model output parsing
pub use feedback::{parse_model_output, ParsedAttempt};

// Re-export escalation types
pub use escalation::{
    AttemptRecord, EscalationConfig, EscalationDecision, EscalationEngine, EscalationState,
    SolveStage, SolveTier, SuggestedAction,
};
