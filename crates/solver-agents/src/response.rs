//! Transport-facing request and response records.

use crate::config::SolverConfig;
use reasoner::{ClassifiedProblem, ModelInfo, SolveResult, Step};
use serde::{Deserialize, Serialize};

fn default_level() -> String {
    "auto".to_string()
}

fn default_locale() -> String {
    "en".to_string()
}

/// A question plus the presentation hints echoed back in the response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SolveRequest {
    pub question: String,
    #[serde(default = "default_level")]
    pub level: String,
    #[serde(default = "default_locale")]
    pub locale: String,
}

impl SolveRequest {
    pub fn new(question: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            level: default_level(),
            locale: default_locale(),
        }
    }

    pub fn with_level(mut self, level: impl Into<String>) -> Self {
        self.level = level.into();
        self
    }

    pub fn with_locale(mut self, locale: impl Into<String>) -> Self {
        self.locale = locale.into();
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SolveResponse {
    pub final_answer: String,
    pub steps: Vec<Step>,
    pub verified: bool,
    pub latex: Option<String>,
    pub level: String,
    pub locale: String,
    pub confidence: f64,
    pub difficulty: i64,
    pub model: ModelInfo,
}

impl SolveResponse {
    /// Combine a run's result with the echoed request fields. `latex` is the
    /// first LaTeX fragment of the problem, if any.
    pub fn from_result(
        result: SolveResult,
        request: &SolveRequest,
        problem: Option<&ClassifiedProblem>,
    ) -> Self {
        Self {
            final_answer: result.answer,
            steps: result.steps,
            verified: result.verified,
            latex: problem.and_then(|p| p.ir.latex.first().cloned()),
            level: request.level.clone(),
            locale: request.locale.clone(),
            confidence: result.confidence,
            difficulty: result.difficulty,
            model: result.model,
        }
    }
}

/// Payload of `math-solver health`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthReport {
    pub ok: bool,
    pub text_model: String,
    pub text_stronger_model: String,
    pub text_provider: String,
}

impl HealthReport {
    pub fn from_config(config: &SolverConfig) -> Self {
        Self {
            ok: config.validate().is_ok(),
            text_model: config.text_model.clone(),
            text_stronger_model: config.stronger_model.clone(),
            text_provider: config.provider.clone(),
        }
    }
}
