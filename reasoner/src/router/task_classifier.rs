//! Task classification
//!
//! Maps raw question text to a [`Task`] with an ordered rule table. Rules are
//! evaluated top to bottom and the first match wins, so the order of
//! [`RULES`] is part of the contract: moving a rule changes outcomes.

use crate::ir::{ClassifiedProblem, ProblemIr, Task};
use crate::router::input_guard::extract_options;
use regex::Regex;
use std::collections::BTreeMap;
use std::sync::LazyLock;

/// Leading "solve" command in English or Vietnamese.
static SOLVE_COMMAND: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^\s*(solve|giải)\b[:\s]*").unwrap());

/// `[[...]]` literals, or two parenthesised groups side by side.
static MATRIX_LITERAL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[\[.*?\]\]|\([^)]*\);?\s*\([^)]*\)").unwrap());

/// Digits, decimal points, whitespace and arithmetic operators only.
static ARITHMETIC_ONLY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9.\s+\-*/^()]+$").unwrap());

const SIMPLIFY_KEYWORDS: &[&str] = &["simplify", "factor", "expand", "reduce"];
const DIFFERENTIATE_KEYWORDS: &[&str] = &["differentiate", "derivative", "d/d"];
const INTEGRATE_KEYWORDS: &[&str] = &["integrate", "integral"];
const LIMIT_KEYWORDS: &[&str] = &["limit", "lim "];
const PROOF_KEYWORDS: &[&str] = &["prove", "show that", "hence", "therefore"];

/// Metadata key carrying the matrix sub-operation.
pub const MATRIX_OP_KEY: &str = "matrix_op";

/// Sub-cascade for matrix questions, first match wins.
const MATRIX_OPS: &[(&[&str], &str)] = &[
    (&["det", "determinant"], "det"),
    (&["inverse", "inv"], "inv"),
    (&["rank"], "rank"),
    (&["rref", "row-reduction", "row reduction"], "rref"),
];

pub type TaskMeta = BTreeMap<String, String>;

/// Remove a leading solve command token, trimming the input first.
pub fn strip_command(text: &str) -> String {
    SOLVE_COMMAND.replace(text.trim(), "").into_owned()
}

/// True if the text contains nothing but numbers and arithmetic operators.
pub fn is_arithmetic_only(text: &str) -> bool {
    let compact = text.replace(' ', "");
    ARITHMETIC_ONLY.is_match(&compact)
}

/// Case-insensitive substring test against any keyword.
pub fn has_keyword(text: &str, keywords: &[&str]) -> bool {
    let lower = text.to_lowercase();
    keywords.iter().any(|k| lower.contains(k))
}

fn has_matrix(text: &str) -> bool {
    MATRIX_LITERAL.is_match(text) || text.to_lowercase().contains("matrix")
}

/// Precomputed views of the question shared by every rule.
#[derive(Debug, Clone)]
pub struct RuleInput {
    /// Trimmed question text.
    pub text: String,
    /// Question with the leading command token removed.
    pub stripped: String,
}

impl RuleInput {
    pub fn new(text: &str) -> Self {
        let text = text.trim().to_string();
        let stripped = strip_command(&text);
        Self { text, stripped }
    }
}

/// One entry of the classification cascade.
pub struct ClassifierRule {
    pub name: &'static str,
    pub task: Task,
    pub matches: fn(&RuleInput) -> bool,
    pub meta: fn(&RuleInput) -> TaskMeta,
}

impl ClassifierRule {
    pub fn applies(&self, text: &str) -> bool {
        (self.matches)(&RuleInput::new(text))
    }
}

impl std::fmt::Debug for ClassifierRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClassifierRule")
            .field("name", &self.name)
            .field("task", &self.task)
            .finish()
    }
}

fn no_meta(_: &RuleInput) -> TaskMeta {
    TaskMeta::new()
}

fn matrix_meta(input: &RuleInput) -> TaskMeta {
    let op = MATRIX_OPS
        .iter()
        .find(|(keywords, _)| has_keyword(&input.text, keywords))
        .map(|(_, op)| *op)
        .unwrap_or("auto");
    let mut meta = TaskMeta::new();
    meta.insert(MATRIX_OP_KEY.to_string(), op.to_string());
    meta
}

fn is_equation(input: &RuleInput) -> bool {
    input.stripped.contains('=')
}

fn is_simplify(input: &RuleInput) -> bool {
    has_keyword(&input.text, SIMPLIFY_KEYWORDS)
}

fn is_differentiate(input: &RuleInput) -> bool {
    has_keyword(&input.text, DIFFERENTIATE_KEYWORDS)
}

fn is_integrate(input: &RuleInput) -> bool {
    has_keyword(&input.text, INTEGRATE_KEYWORDS)
}

fn is_limit(input: &RuleInput) -> bool {
    has_keyword(&input.text, LIMIT_KEYWORDS)
}

fn is_matrix(input: &RuleInput) -> bool {
    has_matrix(&input.text)
}

fn is_evaluate(input: &RuleInput) -> bool {
    is_arithmetic_only(&input.stripped)
}

fn is_proof(input: &RuleInput) -> bool {
    has_keyword(&input.text, PROOF_KEYWORDS)
}

/// The cascade, in priority order.
pub static RULES: &[ClassifierRule] = &[
    ClassifierRule {
        name: "equation",
        task: Task::SolveEquation,
        matches: is_equation,
        meta: no_meta,
    },
    ClassifierRule {
        name: "simplify",
        task: Task::Simplify,
        matches: is_simplify,
        meta: no_meta,
    },
    ClassifierRule {
        name: "differentiate",
        task: Task::Differentiate,
        matches: is_differentiate,
        meta: no_meta,
    },
    ClassifierRule {
        name: "integrate",
        task: Task::Integrate,
        matches: is_integrate,
        meta: no_meta,
    },
    ClassifierRule {
        name: "limit",
        task: Task::Limit,
        matches: is_limit,
        meta: no_meta,
    },
    ClassifierRule {
        name: "matrix",
        task: Task::MatrixOp,
        matches: is_matrix,
        meta: matrix_meta,
    },
    ClassifierRule {
        name: "arithmetic",
        task: Task::Evaluate,
        matches: is_evaluate,
        meta: no_meta,
    },
    ClassifierRule {
        name: "proof",
        task: Task::WordProblem,
        matches: is_proof,
        meta: no_meta,
    },
];

/// Classify question text. Total: falls back to [`Task::Unknown`] with empty meta.
pub fn classify(text: &str) -> (Task, TaskMeta) {
    let input = RuleInput::new(text);
    RULES
        .iter()
        .find(|rule| (rule.matches)(&input))
        .map(|rule| (rule.task, (rule.meta)(&input)))
        .unwrap_or((Task::Unknown, TaskMeta::new()))
}

/// Classifier stage: fill in task and meta, collect answer options.
pub fn classify_problem(ir: ProblemIr) -> ClassifiedProblem {
    let (task, meta) = classify(&ir.text);
    let options = extract_options(&ir.text);
    tracing::info!(task = %task, meta = ?meta, "parse");
    if !options.is_empty() {
        tracing::debug!(count = options.len(), "answer options detected");
    }
    ClassifiedProblem {
        ir: ProblemIr { task, meta, ..ir },
        options,
    }
}
