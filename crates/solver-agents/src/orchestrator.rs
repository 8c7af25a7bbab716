//! Orchestration loop: route a question, then draft → verify → retry → escalate.
//!
//! The loop is strictly sequential. Every model call's output feeds the next
//! decision, and the escalation state refuses a second retry or escalation,
//! so a run makes at most three model calls. Capability faults abort the run
//! and are returned to the caller unchanged.

use std::sync::Arc;
use std::time::Instant;

use thiserror::Error;
use tracing::{info, warn};

use crate::config::ClientSet;
use crate::model::{ChatMessage, ModelCapability, ModelError};
use crate::prompts::{
    solve_messages, vision_messages, ESCALATION_CRITIQUE, PROMPT_VERSION, RETRY_CRITIQUE,
};
use crate::response::{SolveRequest, SolveResponse};
use crate::telemetry::{question_preview, RunSummary};
use crate::vision::ImageInput;
use reasoner::escalation::IllegalTransition;
use reasoner::{
    can_verify, parse_model_output, route, AttemptRecord, ClassifiedProblem, EscalationConfig,
    EscalationEngine, EscalationState, ModelInfo, ParsedAttempt, SolveResult, SolveStage,
    SolveTier, SymbolicVerifier, Task,
};

#[derive(Debug, Error)]
pub enum SolveError {
    /// The model capability could not produce text.
    #[error("{stage} model call failed: {source}")]
    Model {
        stage: SolveStage,
        #[source]
        source: ModelError,
    },

    #[error(transparent)]
    State(#[from] IllegalTransition),
}

impl SolveError {
    /// Stage whose model call failed, if any.
    pub fn stage(&self) -> Option<SolveStage> {
        match self {
            Self::Model { stage, .. } => Some(*stage),
            Self::State(_) => None,
        }
    }
}

/// Tier and critique for a stage that calls a model.
fn call_plan(stage: SolveStage) -> (SolveTier, Option<&'static str>) {
    match stage {
        SolveStage::Retry => (SolveTier::Base, Some(RETRY_CRITIQUE)),
        SolveStage::Escalate => (SolveTier::Strong, Some(ESCALATION_CRITIQUE)),
        _ => (SolveTier::Base, None),
    }
}

fn result_from(attempt: ParsedAttempt, verified: bool, model: ModelInfo) -> SolveResult {
    SolveResult {
        steps: attempt.steps,
        answer: attempt.final_answer,
        verified,
        confidence: attempt.confidence,
        difficulty: attempt.difficulty,
        model,
    }
}

/// Composition root for one solve. Holds no per-request state, so a single
/// instance can serve concurrent requests.
pub struct SolveOrchestrator {
    base: Arc<dyn ModelCapability>,
    strong: Arc<dyn ModelCapability>,
    vision_base: Arc<dyn ModelCapability>,
    vision_strong: Arc<dyn ModelCapability>,
    engine: EscalationEngine,
    verifier: SymbolicVerifier,
}

impl SolveOrchestrator {
    /// Text tiers. Image questions use the same pair until
    /// [`with_vision`](Self::with_vision) says otherwise.
    pub fn new(base: Arc<dyn ModelCapability>, strong: Arc<dyn ModelCapability>) -> Self {
        Self {
            vision_base: base.clone(),
            vision_strong: strong.clone(),
            base,
            strong,
            engine: EscalationEngine::new(),
            verifier: SymbolicVerifier::new(),
        }
    }

    pub fn from_clients(clients: ClientSet, config: EscalationConfig) -> Self {
        Self::new(clients.base, clients.strong)
            .with_vision(clients.vision_base, clients.vision_strong)
            .with_escalation(config)
    }

    pub fn with_vision(
        mut self,
        base: Arc<dyn ModelCapability>,
        strong: Arc<dyn ModelCapability>,
    ) -> Self {
        self.vision_base = base;
        self.vision_strong = strong;
        self
    }

    pub fn with_escalation(mut self, config: EscalationConfig) -> Self {
        self.engine = EscalationEngine::with_config(config);
        self
    }

    fn capability(&self, tier: SolveTier) -> &Arc<dyn ModelCapability> {
        match tier {
            SolveTier::Base => &self.base,
            SolveTier::Strong => &self.strong,
        }
    }

    fn vision_capability(&self, tier: SolveTier) -> &Arc<dyn ModelCapability> {
        match tier {
            SolveTier::Base => &self.vision_base,
            SolveTier::Strong => &self.vision_strong,
        }
    }

    async fn ask(
        model: &Arc<dyn ModelCapability>,
        stage: SolveStage,
        tier: SolveTier,
        messages: &[ChatMessage],
    ) -> Result<(String, ModelInfo), SolveError> {
        let model_info = model.info();
        info!(stage = %stage, tier = %tier, model = %model_info, "model call");
        match model.ask(messages).await {
            Ok(raw) => Ok((raw, model_info)),
            Err(source) => {
                warn!(stage = %stage, model = %model_info, error = %source, "model call failed");
                Err(SolveError::Model { stage, source })
            }
        }
    }

    /// Solve one question.
    pub async fn solve(&self, question: &str) -> Result<SolveResult, SolveError> {
        self.run(question).await.map(|(result, _)| result)
    }

    /// Solve a transport request and build its response.
    pub async fn solve_request(&self, request: &SolveRequest) -> Result<SolveResponse, SolveError> {
        let (result, problem) = self.run(&request.question).await?;
        Ok(SolveResponse::from_result(result, request, problem.as_ref()))
    }

    async fn run(
        &self,
        question: &str,
    ) -> Result<(SolveResult, Option<ClassifiedProblem>), SolveError> {
        let started = Instant::now();
        info!(preview = %question_preview(question), prompt_version = PROMPT_VERSION, "ingest");

        let problem = match route(question) {
            Ok(problem) => problem,
            Err(rejection) => {
                RunSummary::rejected(rejection, started.elapsed()).emit();
                return Ok((rejection.into_result(), None));
            }
        };

        let text = problem.text();
        let mut state = EscalationState::new(can_verify(text));
        let mut stage = SolveStage::Draft;

        loop {
            let (tier, critique) = call_plan(stage);
            let messages = solve_messages(text, critique);
            let (raw, model_info) =
                Self::ask(self.capability(tier), stage, tier, &messages).await?;

            let attempt = parse_model_output(&raw);
            if !attempt.structured {
                warn!(stage = %stage, "model output was not JSON, using raw text");
            }
            state.record_attempt(AttemptRecord {
                stage,
                tier,
                model: model_info.clone(),
                verified: None,
                confidence: attempt.confidence,
                structured: attempt.structured,
            });

            if state.verifiable {
                state.advance(SolveStage::Verify, None)?;
                let verified = self.verifier.verify(text, &attempt.final_answer);
                info!(stage = %stage, verified, answer = %attempt.final_answer, "verify");
                state.record_verification(verified);
            }

            let decision = self.engine.decide(&state);
            info!(
                action = ?decision.action,
                next = %decision.next,
                reason = %decision.reason,
                "escalation decision"
            );
            state.advance(decision.next, Some(decision.reason.as_str()))?;

            if state.is_terminal() {
                let verified = state.latest().and_then(|a| a.verified).unwrap_or(false);
                RunSummary::from_state(problem.task(), &state, verified, started.elapsed()).emit();
                return Ok((result_from(attempt, verified, model_info), Some(problem)));
            }
            stage = decision.next;
        }
    }

    async fn vision_attempt(
        &self,
        stage: SolveStage,
        messages: &[ChatMessage],
        state: &mut EscalationState,
    ) -> Result<(ParsedAttempt, ModelInfo), SolveError> {
        let tier = call_plan(stage).0;
        let (raw, model_info) =
            Self::ask(self.vision_capability(tier), stage, tier, messages).await?;
        let attempt = parse_model_output(&raw);
        state.record_attempt(AttemptRecord {
            stage,
            tier,
            model: model_info.clone(),
            verified: None,
            confidence: attempt.confidence,
            structured: attempt.structured,
        });
        Ok((attempt, model_info))
    }

    /// Solve a question given as an image.
    ///
    /// The image goes to the base vision tier, and to the strong vision tier
    /// once if the reported confidence is low. A strong reply without JSON
    /// does not replace the draft. Nothing here can be checked symbolically,
    /// so the result is never verified. When no answer comes back and OCR
    /// text was supplied, the OCR text is solved as a text question instead.
    pub async fn solve_image(
        &self,
        image: &ImageInput,
        ocr_hint: Option<&str>,
    ) -> Result<SolveResult, SolveError> {
        let started = Instant::now();
        info!(media_type = image.media_type(), bytes = image.len(), "ingest image");

        let messages = vision_messages(&image.data_url(), ocr_hint);
        let mut state = EscalationState::new(false);
        let mut stage = SolveStage::Draft;
        let (mut attempt, mut model_info) =
            self.vision_attempt(stage, &messages, &mut state).await?;

        loop {
            let decision = self.engine.decide(&state);
            info!(next = %decision.next, reason = %decision.reason, "vision escalation decision");
            state.advance(decision.next, Some(decision.reason.as_str()))?;
            if state.is_terminal() {
                break;
            }
            stage = decision.next;
            let (next, next_info) = self.vision_attempt(stage, &messages, &mut state).await?;
            if next.structured {
                attempt = next;
                model_info = next_info;
            } else {
                warn!(stage = %stage, "vision output was not JSON, keeping earlier answer");
            }
        }
        RunSummary::from_state(Task::Unknown, &state, false, started.elapsed()).emit();

        if attempt.final_answer.is_empty() {
            if let Some(hint) = ocr_hint.filter(|h| !h.trim().is_empty()) {
                info!("vision gave no answer, solving the OCR text instead");
                return self.solve(hint).await;
            }
        }
        Ok(result_from(attempt, false, model_info))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Returns scripted responses in order and records every prompt.
    struct Scripted {
        name: &'static str,
        responses: Mutex<VecDeque<String>>,
        prompts: Mutex<Vec<String>>,
    }

    impl Scripted {
        fn new(name: &'static str, responses: &[&str]) -> Arc<Self> {
            Arc::new(Self {
                name,
                responses: Mutex::new(responses.iter().map(|r| r.to_string()).collect()),
                prompts: Mutex::new(Vec::new()),
            })
        }

        fn calls(&self) -> usize {
            self.prompts.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl ModelCapability for Scripted {
        fn info(&self) -> ModelInfo {
            ModelInfo::new("scripted", self.name)
        }

        async fn ask(&self, messages: &[ChatMessage]) -> Result<String, ModelError> {
            let user = messages.last().map(ChatMessage::text).unwrap_or_default();
            self.prompts.lock().unwrap().push(user);
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .ok_or(ModelError::EmptyResponse)
        }
    }

    fn json(answer: &str, confidence: f64) -> String {
        format!(r#"{{"steps":[{{"title":"Solve","explanation":"..."}}],"final_answer":"{answer}","difficulty":2,"confidence":{confidence}}}"#)
    }

    #[tokio::test]
    async fn test_retry_prompt_carries_critique() {
        let wrong = json("x = 3", 0.9);
        let right = json("x = 2", 0.9);
        let base = Scripted::new("base", &[&wrong, &right]);
        let strong = Scripted::new("strong", &[]);
        let orchestrator = SolveOrchestrator::new(base.clone(), strong.clone());

        let result = orchestrator.solve("2x = 4").await.unwrap();
        assert!(result.verified);
        assert_eq!(base.calls(), 2);
        assert_eq!(strong.calls(), 0);

        let prompts = base.prompts.lock().unwrap();
        assert_eq!(prompts[0], "2x = 4");
        assert!(prompts[1].contains(RETRY_CRITIQUE));
    }

    #[tokio::test]
    async fn test_escalation_prompt_and_model_identity() {
        let unsure = json("42", 0.1);
        let sure = json("42", 0.95);
        let base = Scripted::new("base", &[&unsure]);
        let strong = Scripted::new("strong", &[&sure]);
        let orchestrator = SolveOrchestrator::new(base.clone(), strong.clone());

        let result = orchestrator.solve("What is the meaning of life?").await.unwrap();
        assert!(!result.verified);
        assert_eq!(result.model, ModelInfo::new("scripted", "strong"));
        assert_eq!(result.confidence, 0.95);
        assert!(strong.prompts.lock().unwrap()[0].contains(ESCALATION_CRITIQUE));
    }

    #[tokio::test]
    async fn test_fault_reports_stage() {
        let wrong = json("x = 3", 0.9);
        let base = Scripted::new("base", &[&wrong]);
        let strong = Scripted::new("strong", &[]);
        let orchestrator = SolveOrchestrator::new(base, strong);

        let err = orchestrator.solve("2x = 4").await.unwrap_err();
        assert_eq!(err.stage(), Some(SolveStage::Retry));
        assert!(err.to_string().starts_with("retry model call failed"));
    }

    #[tokio::test]
    async fn test_request_echoes_level_and_locale() {
        let right = json("23", 0.9);
        let base = Scripted::new("base", &[&right]);
        let strong = Scripted::new("strong", &[]);
        let orchestrator = SolveOrchestrator::new(base, strong);

        let request = SolveRequest::new("3+4*5").with_level("school").with_locale("vi");
        let response = orchestrator.solve_request(&request).await.unwrap();
        assert_eq!(response.final_answer, "23");
        assert!(response.verified);
        assert_eq!(response.level, "school");
        assert_eq!(response.locale, "vi");
        assert_eq!(response.latex, None);
    }
}
