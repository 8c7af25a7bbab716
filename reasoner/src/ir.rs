//! Problem IR and result records
//!
//! Every stage of a solve produces its own immutable record:
//!
//! ```text
//! raw text → ProblemIr → ClassifiedProblem → ParsedAttempt (per model call) → SolveResult
//! ```
//!
//! Nothing here is shared across requests.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Task category assigned by the classifier. Exactly one per problem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Task {
    SolveEquation,
    Simplify,
    Evaluate,
    Differentiate,
    Integrate,
    Limit,
    MatrixOp,
    LinAlg,
    NumberTheory,
    CoordGeometry,
    WordProblem,
    #[default]
    Unknown,
}

impl Task {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SolveEquation => "solve_equation",
            Self::Simplify => "simplify",
            Self::Evaluate => "evaluate",
            Self::Differentiate => "differentiate",
            Self::Integrate => "integrate",
            Self::Limit => "limit",
            Self::MatrixOp => "matrix_op",
            Self::LinAlg => "lin_alg",
            Self::NumberTheory => "number_theory",
            Self::CoordGeometry => "coord_geometry",
            Self::WordProblem => "word_problem",
            Self::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for Task {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Normalized form of the raw question plus classification metadata.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ProblemIr {
    pub text: String,
    #[serde(default)]
    pub latex: Vec<String>,
    #[serde(default)]
    pub task: Task,
    #[serde(default)]
    pub expressions: Vec<String>,
    #[serde(default)]
    pub variables: Vec<String>,
    #[serde(default)]
    pub meta: BTreeMap<String, String>,
}

impl ProblemIr {
    /// Ingest raw question text. The text is trimmed; task and meta stay unset
    /// until classification.
    pub fn from_text(text: impl AsRef<str>) -> Self {
        Self {
            text: text.as_ref().trim().to_string(),
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

/// Output of the classifier stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifiedProblem {
    /// IR with task and meta filled in.
    pub ir: ProblemIr,
    /// Multiple-choice options found in the text, keyed by choice index.
    pub options: BTreeMap<String, String>,
}

impl ClassifiedProblem {
    pub fn text(&self) -> &str {
        &self.ir.text
    }

    pub fn task(&self) -> Task {
        self.ir.task
    }
}

/// One step of the solution narrative.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Step {
    pub title: String,
    pub explanation: String,
}

impl Step {
    pub fn new(title: impl Into<String>, explanation: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            explanation: explanation.into(),
        }
    }
}

/// Which model produced the accepted answer.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ModelInfo {
    pub provider: String,
    pub name: String,
}

impl ModelInfo {
    pub fn new(provider: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            provider: provider.into(),
            name: name.into(),
        }
    }

    /// Tag used when no model was consulted.
    pub fn unknown() -> Self {
        Self::new("unknown", "unknown")
    }
}

impl std::fmt::Display for ModelInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.provider, self.name)
    }
}

/// Final orchestrator output handed back to the transport layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SolveResult {
    pub steps: Vec<Step>,
    pub answer: String,
    pub verified: bool,
    /// Self-reported confidence, clamped to `[0, 1]`.
    pub confidence: f64,
    pub difficulty: i64,
    pub model: ModelInfo,
}

impl SolveResult {
    /// Degraded result for input that never reaches a model.
    pub fn input_error(explanation: impl Into<String>) -> Self {
        Self {
            steps: vec![Step::new("Input error", explanation)],
            answer: String::new(),
            verified: false,
            confidence: 0.0,
            difficulty: 0,
            model: ModelInfo::unknown(),
        }
    }

    pub fn is_input_error(&self) -> bool {
        self.model == ModelInfo::unknown()
            && self.steps.len() == 1
            && self.steps[0].title == "Input error"
    }
}
