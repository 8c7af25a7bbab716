//! Input gates that run before any model call, plus the answer-option extractor.

use crate::ir::SolveResult;
use regex::Regex;
use std::collections::BTreeMap;
use std::sync::LazyLock;

/// A line that starts with a choice index, e.g. `(2) 3/4` or `1 x=2`.
static CHOICE_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\(?\d+\)?\s*[\w.\-/\\%]+").unwrap());

/// `(n) text`, the strict option format used for extraction.
static OPTION_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\(\s*(\d+)\s*\)\s*(.+)$").unwrap());

pub const EMPTY_INPUT_MESSAGE: &str = "No question text provided.";
pub const CHOICES_ONLY_MESSAGE: &str =
    "Only answer choices detected. Please include the actual question.";

/// Why an input was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputRejection {
    Empty,
    ChoicesOnly,
}

impl InputRejection {
    pub fn message(&self) -> &'static str {
        match self {
            Self::Empty => EMPTY_INPUT_MESSAGE,
            Self::ChoicesOnly => CHOICES_ONLY_MESSAGE,
        }
    }

    /// Degraded result returned instead of calling a model.
    pub fn into_result(self) -> SolveResult {
        SolveResult::input_error(self.message())
    }
}

impl std::fmt::Display for InputRejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Empty => write!(f, "empty"),
            Self::ChoicesOnly => write!(f, "choices_only"),
        }
    }
}

/// True when every non-blank line is an answer choice and there are at least two.
pub fn looks_like_only_choices(text: &str) -> bool {
    let (choices, others) = text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .fold((0usize, 0usize), |(choices, others), line| {
            if CHOICE_LINE.is_match(line) {
                (choices + 1, others)
            } else {
                (choices, others + 1)
            }
        });
    choices >= 2 && others == 0
}

/// Run both gates. `None` means the question may proceed to a model.
pub fn check_input(text: &str) -> Option<InputRejection> {
    if text.trim().is_empty() {
        return Some(InputRejection::Empty);
    }
    if looks_like_only_choices(text) {
        return Some(InputRejection::ChoicesOnly);
    }
    None
}

/// Collect `(n) choice` lines into an index → choice map.
///
/// A choice wrapped in a single pair of `$` has the delimiters removed.
/// Lines in any other format are skipped.
pub fn extract_options(text: &str) -> BTreeMap<String, String> {
    let mut options = BTreeMap::new();
    for line in text.lines() {
        let Some(caps) = OPTION_LINE.captures(line.trim()) else {
            continue;
        };
        let key = caps[1].to_string();
        let mut value = caps[2].trim();
        if value.starts_with('$') && value.ends_with('$') {
            // A lone `$` is both delimiters and leaves nothing.
            value = value.get(1..value.len() - 1).unwrap_or_default().trim();
        }
        options.insert(key, value.to_string());
    }
    options
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_options_strips_dollars() {
        let options = extract_options("(1) $3$\n(2) 4");
        let expected: BTreeMap<String, String> = [("1", "3"), ("2", "4")]
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        assert_eq!(options, expected);
    }

    #[test]
    fn test_extract_options_lone_dollar_is_empty() {
        let options = extract_options("(1) $\n(2) $$\n(3) $ 7 $");
        assert_eq!(options.get("1").map(String::as_str), Some(""));
        assert_eq!(options.get("2").map(String::as_str), Some(""));
        assert_eq!(options.get("3").map(String::as_str), Some("7"));
    }

    #[test]
    fn test_extract_options_skips_other_lines() {
        let options = extract_options("Pick the root of x^2 = 4\n( 1 )  $ 2 $\n2) -2\n(3)");
        assert_eq!(options.len(), 1);
        assert_eq!(options.get("1").map(String::as_str), Some("2"));
    }

    #[test]
    fn test_choices_only_detection() {
        assert!(looks_like_only_choices("(1) 2\n(2) 3"));
        assert!(looks_like_only_choices("1) x=2\n\n2) x=-2\n3) 50%"));
        assert!(!looks_like_only_choices("(1) 2"));
        assert!(!looks_like_only_choices("Solve x^2 = 4\n(1) 2\n(2) -2"));
        assert!(!looks_like_only_choices(""));
    }

    #[test]
    fn test_check_input_gates() {
        assert_eq!(check_input("  \n\t "), Some(InputRejection::Empty));
        assert_eq!(check_input("(1) 2\n(2) 3"), Some(InputRejection::ChoicesOnly));
        assert_eq!(check_input("2x = 4"), None);
    }

    #[test]
    fn test_rejection_results_differ() {
        let empty = InputRejection::Empty.into_result();
        let choices = InputRejection::ChoicesOnly.into_result();
        assert_eq!(empty.steps[0].explanation, EMPTY_INPUT_MESSAGE);
        assert_eq!(choices.steps[0].explanation, CHOICES_ONLY_MESSAGE);
        assert!(empty.is_input_error() && choices.is_input_error());
    }
}
