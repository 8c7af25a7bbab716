//! Prompt constants for the solving tiers.
//!
//! Prompt versioning: bump `PROMPT_VERSION` whenever any prompt or critique
//! text changes, so logged runs can be tied to the wording that produced them.

use crate::model::{ChatMessage, ContentPart};

/// Prompt version. Bump on any prompt content change.
pub const PROMPT_VERSION: &str = "1.3.0";

/// System prompt shared by both tiers.
pub const SOLVE_SYSTEM_PROMPT: &str = "\
You are an expert math teacher. Solve the user's problem step-by-step with small, clear steps.
Always output ONLY a compact JSON object with keys:
{
  \"steps\": [ {\"title\": str, \"explanation\": str}, ... ],
  \"final_answer\": str,
  \"difficulty\": int,
  \"confidence\": float,
  \"topic\": str
}
Rules:
- Keep steps concise and didactic.
- Put the actual result in final_answer (e.g., 'x = 3', '33/7', or '(3)').
- Do NOT include any extra commentary outside the JSON.
";

/// Critique sent with the base-tier retry after a failed symbolic check.
pub const RETRY_CRITIQUE: &str =
    "Your final answer does not check out symbolically. Fix arithmetic/logic and re-output JSON.";

/// Critique sent to the strong tier.
pub const ESCALATION_CRITIQUE: &str = "Produce a more rigorous, carefully verified solution.";

/// Instructions for solving from an image. Sent as the first part of the
/// user message, ahead of the image.
pub const VISION_INSTRUCTIONS: &str = "\
You are an expert math teacher. Look at the image and solve using visual evidence.
- If it's a shaded grid: COUNT shaded cells and total cells explicitly.
- If it's geometry: read lengths/angles/labels from the picture before derivation.
- If multiple choices exist, do NOT guess from options; derive from image data.
Output ONLY JSON: {\"steps\":[{\"title\":str,\"explanation\":str},...],\"final_answer\":str,\"difficulty\":int,\"confidence\":float,\"topic\":str}
If the question text is missing (only choices), output {\"steps\":[...],\"final_answer\":\"\",\"difficulty\":1,\"confidence\":0.0,\"topic\":\"incomplete\"}.
";

/// User message: the question, plus a self-correction hint when given.
pub fn user_message(question: &str, critique: Option<&str>) -> String {
    match critique {
        Some(hint) => format!("{question}\n\n---\nSelf-correction hint: {hint}\nPlease output JSON."),
        None => question.to_string(),
    }
}

/// Full message list for one solving call.
pub fn solve_messages(question: &str, critique: Option<&str>) -> Vec<ChatMessage> {
    vec![
        ChatMessage::system(SOLVE_SYSTEM_PROMPT),
        ChatMessage::user(user_message(question, critique)),
    ]
}

/// Single user message: instructions, the image, then any OCR text as a weak hint.
pub fn vision_messages(image_url: &str, ocr_hint: Option<&str>) -> Vec<ChatMessage> {
    let mut parts = vec![
        ContentPart::text(VISION_INSTRUCTIONS),
        ContentPart::image(image_url),
    ];
    if let Some(hint) = ocr_hint.map(str::trim).filter(|h| !h.is_empty()) {
        parts.push(ContentPart::text(format!("OCR hint (weak):\n{hint}")));
    }
    vec![ChatMessage::user_parts(parts)]
}
