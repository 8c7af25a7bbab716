//! Model Output Parser: lenient extraction of a structured attempt
//!
//! Models are asked for one JSON object, but they wrap it in code fences,
//! surround it with prose, or ignore the instruction entirely. Parsing never
//! fails: unusable output degrades to a single low-confidence step carrying
//! the raw text.

use crate::ir::Step;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::LazyLock;

/// A JSON object inside a (optionally `json`-labelled) code fence.
static FENCED_JSON: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)```(?:json)?\s*(\{.*?\})\s*```").unwrap());

pub const FALLBACK_DIFFICULTY: i64 = 3;
pub const FALLBACK_CONFIDENCE: f64 = 0.4;
pub const FALLBACK_STEP_TITLE: &str = "Explanation";
pub const EMPTY_STEP_TEXT: &str = "(empty)";

/// One model answer, normalised.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParsedAttempt {
    pub steps: Vec<Step>,
    pub final_answer: String,
    pub difficulty: i64,
    /// Always within [0, 1].
    pub confidence: f64,
    pub topic: Option<String>,
    /// False when the raw-text fallback was used.
    pub structured: bool,
}

impl ParsedAttempt {
    /// Fallback for output with no usable JSON object.
    pub fn from_raw(raw: &str) -> Self {
        Self {
            steps: vec![Step::new(FALLBACK_STEP_TITLE, raw.trim())],
            final_answer: String::new(),
            difficulty: FALLBACK_DIFFICULTY,
            confidence: FALLBACK_CONFIDENCE,
            topic: None,
            structured: false,
        }
    }

    fn from_object(obj: &Map<String, Value>) -> Self {
        let mut steps: Vec<Step> = obj
            .get("steps")
            .and_then(Value::as_array)
            .map(|items| items.iter().filter_map(step_from_value).collect())
            .unwrap_or_default();
        if steps.is_empty() {
            steps.push(Step::new(FALLBACK_STEP_TITLE, EMPTY_STEP_TEXT));
        }

        let final_answer = match obj.get("final_answer") {
            Some(Value::String(s)) => s.trim().to_string(),
            Some(Value::Number(n)) => n.to_string(),
            Some(Value::Bool(b)) => b.to_string(),
            _ => String::new(),
        };

        let difficulty = obj
            .get("difficulty")
            .and_then(lenient_int)
            .unwrap_or(FALLBACK_DIFFICULTY);

        let confidence = obj
            .get("confidence")
            .and_then(lenient_float)
            .filter(|c| c.is_finite())
            .unwrap_or(FALLBACK_CONFIDENCE)
            .clamp(0.0, 1.0);

        let topic = obj
            .get("topic")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string);

        Self {
            steps,
            final_answer,
            difficulty,
            confidence,
            topic,
            structured: true,
        }
    }
}

fn step_from_value(value: &Value) -> Option<Step> {
    let title = value.get("title")?.as_str()?;
    let explanation = value.get("explanation")?.as_str()?;
    Some(Step::new(title.trim(), explanation.trim()))
}

fn lenient_int(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f.trunc() as i64)),
        Value::String(s) => {
            let s = s.trim();
            s.parse::<i64>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().filter(|f| f.is_finite()).map(|f| f.trunc() as i64))
        }
        _ => None,
    }
}

fn lenient_float(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}

/// Locate the JSON object in `raw`: fenced first, then the whole text, then
/// the outermost `{ ... }` span.
fn extract_object(raw: &str) -> Option<Map<String, Value>> {
    let as_object = |text: &str| match serde_json::from_str::<Value>(text) {
        Ok(Value::Object(map)) if !map.is_empty() => Some(map),
        _ => None,
    };

    if let Some(caps) = FENCED_JSON.captures(raw) {
        if let Some(obj) = as_object(&caps[1]) {
            return Some(obj);
        }
    }

    let trimmed = raw.trim();
    if let Some(obj) = as_object(trimmed) {
        return Some(obj);
    }

    let start = trimmed.find('{')?;
    let end = trimmed.rfind('}')?;
    if end <= start {
        return None;
    }
    as_object(&trimmed[start..=end])
}

/// Parse a model response. Never fails.
pub fn parse_model_output(raw: &str) -> ParsedAttempt {
    match extract_object(raw) {
        Some(obj) => ParsedAttempt::from_object(&obj),
        None => {
            tracing::debug!(chars = raw.len(), "model output has no JSON object, using raw text");
            ParsedAttempt::from_raw(raw)
        }
    }
}
