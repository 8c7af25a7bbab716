//! Escalation Engine: Deterministic State Machine for Tier Routing
//!
//! Decides, after each model attempt, whether to accept the answer, retry on
//! the base tier, or escalate to the strong tier. Pure and synchronous: the
//! async orchestrator owns the model calls and feeds results back in.
//!
//! # Escalation ladder
//!
//! ```text
//! Draft (base)
//!     │
//!     ├─ verifiable and check fails → Retry (base, once)
//!     │                                   │
//!     ▼                                   ▼
//! still unverified OR confidence < 0.6 → Escalate (strong, once)
//!     │
//!     ▼
//! Final (at most 3 model calls)
//! ```

pub mod engine;
pub mod state;

pub use engine::{EscalationConfig, EscalationDecision, EscalationEngine, SuggestedAction};
pub use state::{
    AttemptRecord, EscalationState, IllegalTransition, SolveStage, SolveTier, TransitionRecord,
};
