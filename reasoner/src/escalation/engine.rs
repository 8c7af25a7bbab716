//! Escalation Engine: deterministic choice of the next stage
//!
//! Reads the latest attempt in an [`EscalationState`] and decides whether to
//! retry on the base tier, escalate to the strong tier, or accept. No model
//! calls happen here.

use crate::escalation::state::{EscalationState, SolveStage, SolveTier};
use serde::{Deserialize, Serialize};

/// Decision produced by the Escalation Engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EscalationDecision {
    /// Stage to enter next
    pub next: SolveStage,
    /// Tier that handles the next model call, or that produced the accepted answer
    pub tier: SolveTier,
    pub action: SuggestedAction,
    pub reason: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SuggestedAction {
    /// No attempt yet: ask the base tier
    Draft,
    /// Ask the base tier again with a self-correction critique
    Retry,
    /// Ask the strong tier for a more rigorous solution
    Escalate,
    /// Keep the current answer
    Accept,
}

/// Configuration for the Escalation Engine
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EscalationConfig {
    /// Answers below this self-reported confidence are escalated
    pub confidence_threshold: f64,
    /// Whether a failed verification earns one base-tier retry
    pub allow_retry: bool,
    /// Whether the strong tier may be consulted at all
    pub allow_escalation: bool,
}

impl Default for EscalationConfig {
    fn default() -> Self {
        Self {
            confidence_threshold: 0.6,
            allow_retry: true,
            allow_escalation: true,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct EscalationEngine {
    config: EscalationConfig,
}

impl EscalationEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: EscalationConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EscalationConfig {
        &self.config
    }

    /// Decide the next stage from the latest attempt.
    ///
    /// 1. Draft failed verification → retry once on base.
    /// 2. Still unverified, or confidence below threshold → escalate once.
    /// 3. Otherwise accept.
    pub fn decide(&self, state: &EscalationState) -> EscalationDecision {
        let Some(latest) = state.latest() else {
            return EscalationDecision {
                next: SolveStage::Draft,
                tier: SolveTier::Base,
                action: SuggestedAction::Draft,
                reason: "no attempt yet".to_string(),
            };
        };

        if latest.stage == SolveStage::Draft
            && latest.failed_verification()
            && self.config.allow_retry
            && !state.has_retried()
        {
            return EscalationDecision {
                next: SolveStage::Retry,
                tier: SolveTier::Base,
                action: SuggestedAction::Retry,
                reason: "symbolic check failed on draft".to_string(),
            };
        }

        let unverified = state.verifiable && latest.verified != Some(true);
        let unconfident = latest.confidence < self.config.confidence_threshold;
        if (unverified || unconfident) && self.config.allow_escalation && !state.has_escalated() {
            let reason = match (unverified, unconfident) {
                (true, true) => format!(
                    "unverified and confidence {:.2} < {:.2}",
                    latest.confidence, self.config.confidence_threshold
                ),
                (true, false) => "symbolic check still failing".to_string(),
                _ => format!(
                    "confidence {:.2} < {:.2}",
                    latest.confidence, self.config.confidence_threshold
                ),
            };
            return EscalationDecision {
                next: SolveStage::Escalate,
                tier: SolveTier::Strong,
                action: SuggestedAction::Escalate,
                reason,
            };
        }

        let reason = match latest.verified {
            Some(true) => "verified",
            Some(false) => "unverified, no escalation left",
            None => "accepted unverifiable answer",
        };
        EscalationDecision {
            next: SolveStage::Final,
            tier: latest.tier,
            action: SuggestedAction::Accept,
            reason: reason.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::escalation::state::AttemptRecord;
    use crate::ir::ModelInfo;

    fn push(state: &mut EscalationState, stage: SolveStage, verified: Option<bool>, confidence: f64) {
        let tier = if stage == SolveStage::Escalate {
            SolveTier::Strong
        } else {
            SolveTier::Base
        };
        state.record_attempt(AttemptRecord {
            stage,
            tier,
            model: ModelInfo::new("test", tier.to_string()),
            verified,
            confidence,
            structured: true,
        });
    }

    #[test]
    fn test_no_attempt_means_draft() {
        let decision = EscalationEngine::new().decide(&EscalationState::new(true));
        assert_eq!(decision.action, SuggestedAction::Draft);
    }

    #[test]
    fn test_verified_confident_draft_is_accepted() {
        let mut state = EscalationState::new(true);
        push(&mut state, SolveStage::Draft, Some(true), 0.9);
        let decision = EscalationEngine::new().decide(&state);
        assert_eq!(decision.action, SuggestedAction::Accept);
        assert_eq!(decision.tier, SolveTier::Base);
    }

    #[test]
    fn test_failed_draft_retries() {
        let mut state = EscalationState::new(true);
        push(&mut state, SolveStage::Draft, Some(false), 0.9);
        let decision = EscalationEngine::new().decide(&state);
        assert_eq!(decision.next, SolveStage::Retry);
        assert_eq!(decision.tier, SolveTier::Base);
    }

    #[test]
    fn test_failed_retry_escalates() {
        let mut state = EscalationState::new(true);
        state.advance(SolveStage::Verify, None).unwrap();
        state.advance(SolveStage::Retry, None).unwrap();
        push(&mut state, SolveStage::Retry, Some(false), 0.95);
        let decision = EscalationEngine::new().decide(&state);
        assert_eq!(decision.action, SuggestedAction::Escalate);
        assert_eq!(decision.tier, SolveTier::Strong);
    }

    #[test]
    fn test_low_confidence_unverifiable_escalates() {
        let mut state = EscalationState::new(false);
        push(&mut state, SolveStage::Draft, None, 0.3);
        let decision = EscalationEngine::new().decide(&state);
        assert_eq!(decision.action, SuggestedAction::Escalate);
        assert!(decision.reason.contains("0.30"));
    }

    #[test]
    fn test_threshold_is_strict() {
        let mut state = EscalationState::new(false);
        push(&mut state, SolveStage::Draft, None, 0.6);
        assert_eq!(EscalationEngine::new().decide(&state).action, SuggestedAction::Accept);
    }

    #[test]
    fn test_after_escalation_always_accepts() {
        let mut state = EscalationState::new(true);
        state.advance(SolveStage::Escalate, None).unwrap();
        push(&mut state, SolveStage::Escalate, Some(false), 0.1);
        let decision = EscalationEngine::new().decide(&state);
        assert_eq!(decision.action, SuggestedAction::Accept);
        assert_eq!(decision.tier, SolveTier::Strong);
    }

    #[test]
    fn test_disabled_stages_only_remove_calls() {
        let config = EscalationConfig {
            allow_retry: false,
            allow_escalation: false,
            ..EscalationConfig::default()
        };
        let mut state = EscalationState::new(true);
        push(&mut state, SolveStage::Draft, Some(false), 0.1);
        let decision = EscalationEngine::with_config(config).decide(&state);
        assert_eq!(decision.action, SuggestedAction::Accept);
    }

    #[test]
    fn test_retry_disabled_goes_straight_to_escalation() {
        let config = EscalationConfig {
            allow_retry: false,
            ..EscalationConfig::default()
        };
        let mut state = EscalationState::new(true);
        push(&mut state, SolveStage::Draft, Some(false), 0.9);
        let decision = EscalationEngine::with_config(config).decide(&state);
        assert_eq!(decision.action, SuggestedAction::Escalate);
    }
}
