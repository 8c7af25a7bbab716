//! Per-run telemetry.
//!
//! Every orchestration run ends with exactly one `run summary` event.
//! Question text only ever appears as a bounded preview.

use reasoner::escalation::{EscalationState, SolveTier};
use reasoner::{InputRejection, Task};
use serde::Serialize;
use std::time::Duration;

/// Characters of question text included in logs.
pub const PREVIEW_CHARS: usize = 120;

/// First [`PREVIEW_CHARS`] characters of `text`, on a char boundary.
pub fn question_preview(text: &str) -> String {
    text.trim().chars().take(PREVIEW_CHARS).collect()
}

/// Outcome of one orchestration run, for logs only.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunSummary {
    pub task: Task,
    pub model_calls: usize,
    pub retried: bool,
    pub escalated: bool,
    pub verifiable: bool,
    pub verified: bool,
    pub final_tier: Option<SolveTier>,
    /// Visited stages, e.g. `draft → verify → final`.
    pub stages: String,
    pub elapsed_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rejected: Option<InputRejectionLabel>,
}

/// Serializable label for a rejected input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum InputRejectionLabel {
    Empty,
    ChoicesOnly,
}

impl From<InputRejection> for InputRejectionLabel {
    fn from(rejection: InputRejection) -> Self {
        match rejection {
            InputRejection::Empty => Self::Empty,
            InputRejection::ChoicesOnly => Self::ChoicesOnly,
        }
    }
}

impl RunSummary {
    pub fn from_state(task: Task, state: &EscalationState, verified: bool, elapsed: Duration) -> Self {
        Self {
            task,
            model_calls: state.model_calls(),
            retried: state.has_retried(),
            escalated: state.has_escalated(),
            verifiable: state.verifiable,
            verified,
            final_tier: Some(state.current_tier()),
            stages: state.summary(),
            elapsed_ms: elapsed.as_millis() as u64,
            rejected: None,
        }
    }

    pub fn rejected(rejection: InputRejection, elapsed: Duration) -> Self {
        Self {
            task: Task::Unknown,
            model_calls: 0,
            retried: false,
            escalated: false,
            verifiable: false,
            verified: false,
            final_tier: None,
            stages: String::new(),
            elapsed_ms: elapsed.as_millis() as u64,
            rejected: Some(rejection.into()),
        }
    }

    pub fn emit(&self) {
        tracing::info!(
            task = %self.task,
            model_calls = self.model_calls,
            retried = self.retried,
            escalated = self.escalated,
            verifiable = self.verifiable,
            verified = self.verified,
            final_tier = ?self.final_tier,
            stages = %self.stages,
            elapsed_ms = self.elapsed_ms,
            rejected = ?self.rejected,
            "run summary"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reasoner::escalation::SolveStage;

    #[test]
    fn test_preview_is_bounded_and_char_safe() {
        let long = "é".repeat(500);
        let preview = question_preview(&long);
        assert_eq!(preview.chars().count(), PREVIEW_CHARS);
        assert_eq!(question_preview("  2x = 4  "), "2x = 4");
    }

    #[test]
    fn test_summary_from_state() {
        let mut state = EscalationState::new(true);
        state.advance(SolveStage::Verify, None).unwrap();
        state.advance(SolveStage::Final, None).unwrap();
        let summary =
            RunSummary::from_state(Task::SolveEquation, &state, true, Duration::from_millis(42));
        assert_eq!(summary.stages, "draft → verify → final");
        assert_eq!(summary.elapsed_ms, 42);
        assert_eq!(summary.final_tier, Some(SolveTier::Base));
        assert!(summary.rejected.is_none());
    }

    #[test]
    fn test_rejected_summary_serializes_reason() {
        let summary = RunSummary::rejected(InputRejection::ChoicesOnly, Duration::ZERO);
        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["rejected"], "choices_only");
        assert_eq!(json["model_calls"], 0);
    }
}
