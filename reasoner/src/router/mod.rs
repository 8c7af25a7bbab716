//! Problem Router Module
//!
//! Everything that runs before the first model call:
//! - Input gates (empty text, answer-choices-only text)
//! - Answer option extraction
//! - Task classification
//!
//! # Classification cascade
//!
//! ```text
//! Rule            | Trigger                                   | Task
//! ----------------|-------------------------------------------|----------------
//! equation        | `=` after stripping "solve"               | solve_equation
//! simplify        | simplify / factor / expand / reduce       | simplify
//! differentiate   | differentiate / derivative / d/d          | differentiate
//! integrate       | integrate / integral                      | integrate
//! limit           | limit / "lim "                            | limit
//! matrix          | [[..]] / (..)(..) / "matrix"              | matrix_op
//! arithmetic      | digits and + - * / ^ ( ) only             | evaluate
//! proof           | prove / show that / hence / therefore     | word_problem
//! (none)          |                                           | unknown
//! ```

pub mod input_guard;
pub mod task_classifier;

pub use input_guard::{check_input, extract_options, looks_like_only_choices, InputRejection};
pub use task_classifier::{
    classify, classify_problem, is_arithmetic_only, strip_command, ClassifierRule, TaskMeta,
    MATRIX_OP_KEY, RULES,
};

use crate::ir::{ClassifiedProblem, ProblemIr};

/// Gate the input, then classify it. `Err` means no model may be called.
pub fn route(text: &str) -> Result<ClassifiedProblem, InputRejection> {
    if let Some(rejection) = check_input(text) {
        tracing::info!(rejection = %rejection, "input rejected");
        return Err(rejection);
    }
    Ok(classify_problem(ProblemIr::from_text(text)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::Task;

    #[test]
    fn test_route_rejects_before_classifying() {
        assert_eq!(route("").unwrap_err(), InputRejection::Empty);
        assert_eq!(route("(1) 2\n(2) 3").unwrap_err(), InputRejection::ChoicesOnly);
    }

    #[test]
    fn test_route_classifies_and_extracts_options() {
        let problem = route("  Solve x^2 = 4\n(1) $2$\n(2) -2 ").unwrap();
        assert_eq!(problem.task(), Task::SolveEquation);
        assert_eq!(problem.options.get("1").map(String::as_str), Some("2"));
        assert_eq!(problem.options.len(), 2);
    }
}
