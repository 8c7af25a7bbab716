//! Escalation State: stages, legal transitions and per-run attempt history
//!
//! A run walks `Draft → (Verify) → (Retry) → (Escalate) → Final`. Retry and
//! Escalate may each be entered at most once, which bounds every run to
//! three model calls.

use crate::ir::ModelInfo;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Model tiers available to a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SolveTier {
    /// Cheap, fast model used for the draft and the retry.
    Base,
    /// Higher-quality model used once on escalation.
    Strong,
}

impl fmt::Display for SolveTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Base => write!(f, "base"),
            Self::Strong => write!(f, "strong"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SolveStage {
    Draft,
    Verify,
    Retry,
    Escalate,
    Final,
}

impl SolveStage {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Final)
    }

    /// Stages that issue a model call.
    pub fn calls_model(self) -> bool {
        matches!(self, Self::Draft | Self::Retry | Self::Escalate)
    }
}

impl fmt::Display for SolveStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Draft => write!(f, "draft"),
            Self::Verify => write!(f, "verify"),
            Self::Retry => write!(f, "retry"),
            Self::Escalate => write!(f, "escalate"),
            Self::Final => write!(f, "final"),
        }
    }
}

/// Legal edges of the stage graph:
/// ```text
/// Draft    → Verify | Escalate | Final
/// Verify   → Retry | Escalate | Final
/// Retry    → Verify | Escalate | Final
/// Escalate → Verify | Final
/// ```
fn is_legal_transition(from: SolveStage, to: SolveStage) -> bool {
    use SolveStage::*;

    matches!(
        (from, to),
        (Draft, Verify)
            | (Draft, Escalate)
            | (Draft, Final)
            | (Verify, Retry)
            | (Verify, Escalate)
            | (Verify, Final)
            | (Retry, Verify)
            | (Retry, Escalate)
            | (Retry, Final)
            | (Escalate, Verify)
            | (Escalate, Final)
    )
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransitionRecord {
    pub from: SolveStage,
    pub to: SolveStage,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("illegal stage transition: {from} → {to}")]
pub struct IllegalTransition {
    pub from: SolveStage,
    pub to: SolveStage,
}

/// One model call and what came of it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttemptRecord {
    pub stage: SolveStage,
    pub tier: SolveTier,
    pub model: ModelInfo,
    /// `None` until checked, and for unverifiable questions.
    pub verified: Option<bool>,
    pub confidence: f64,
    /// Whether the response contained a usable JSON object.
    pub structured: bool,
}

impl AttemptRecord {
    /// Verifiable but not proven correct.
    pub fn failed_verification(&self) -> bool {
        self.verified == Some(false)
    }
}

/// Request-scoped state of one orchestration run. Never shared between runs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EscalationState {
    /// Whether the question itself admits symbolic verification.
    pub verifiable: bool,
    current: SolveStage,
    attempts: Vec<AttemptRecord>,
    transitions: Vec<TransitionRecord>,
    retried: bool,
    escalated: bool,
}

impl EscalationState {
    /// Fresh state positioned at `Draft`.
    pub fn new(verifiable: bool) -> Self {
        Self {
            verifiable,
            current: SolveStage::Draft,
            attempts: Vec::new(),
            transitions: Vec::new(),
            retried: false,
            escalated: false,
        }
    }

    pub fn current(&self) -> SolveStage {
        self.current
    }

    /// Move to `to`, rejecting edges outside the graph and a second entry
    /// into Retry or Escalate.
    pub fn advance(&mut self, to: SolveStage, reason: Option<&str>) -> Result<(), IllegalTransition> {
        let repeated = (to == SolveStage::Retry && self.retried)
            || (to == SolveStage::Escalate && self.escalated);
        if repeated || !is_legal_transition(self.current, to) {
            return Err(IllegalTransition {
                from: self.current,
                to,
            });
        }

        tracing::debug!(from = %self.current, to = %to, "stage transition");

        self.transitions.push(TransitionRecord {
            from: self.current,
            to,
            reason: reason.map(String::from),
        });
        self.current = to;
        match to {
            SolveStage::Retry => self.retried = true,
            SolveStage::Escalate => self.escalated = true,
            _ => {}
        }
        Ok(())
    }

    pub fn record_attempt(&mut self, attempt: AttemptRecord) {
        self.attempts.push(attempt);
    }

    /// Store the verification outcome on the most recent attempt.
    pub fn record_verification(&mut self, verified: bool) {
        if let Some(last) = self.attempts.last_mut() {
            last.verified = Some(verified);
        }
    }

    pub fn latest(&self) -> Option<&AttemptRecord> {
        self.attempts.last()
    }

    pub fn attempts(&self) -> &[AttemptRecord] {
        &self.attempts
    }

    pub fn transitions(&self) -> &[TransitionRecord] {
        &self.transitions
    }

    pub fn model_calls(&self) -> usize {
        self.attempts.len()
    }

    pub fn has_retried(&self) -> bool {
        self.retried
    }

    pub fn has_escalated(&self) -> bool {
        self.escalated
    }

    /// Tier that produced the current answer.
    pub fn current_tier(&self) -> SolveTier {
        self.latest().map(|a| a.tier).unwrap_or(SolveTier::Base)
    }

    pub fn is_terminal(&self) -> bool {
        self.current.is_terminal()
    }

    /// `draft → verify → final` style trail of visited stages.
    pub fn summary(&self) -> String {
        std::iter::once(SolveStage::Draft)
            .chain(self.transitions.iter().map(|t| t.to))
            .map(|s| s.to_string())
            .collect::<Vec<_>>()
            .join(" → ")
    }
}
