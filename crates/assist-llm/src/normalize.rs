//! Reduce a raw model response body to a single answer string.
//!
//! The Gemini shape (`candidates[0].content.parts[*].text`) is tried first.
//! Bodies in another shape fall back to an `answer` field, then an `output`
//! field, then the serialized body itself. A body carrying `candidates` is
//! never stringified; a candidate without text yields an empty string.

use serde_json::Value;

/// Extract the answer text from a response body.
pub fn extract_text(body: &Value) -> String {
    if body.get("candidates").is_some() {
        return candidate_text(body).unwrap_or_default();
    }
    for key in ["answer", "output"] {
        match body.get(key) {
            Some(Value::String(s)) => return s.clone(),
            Some(Value::Null) | None => {}
            Some(other) => return other.to_string(),
        }
    }
    match body {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Concatenated text parts of the first candidate, if present.
pub fn candidate_text(body: &Value) -> Option<String> {
    let parts = body
        .get("candidates")?
        .as_array()?
        .first()?
        .get("content")?
        .get("parts")?
        .as_array()?;

    let text: String = parts
        .iter()
        .filter_map(|p| p.get("text").and_then(Value::as_str))
        .collect();

    Some(text)
}

/// Finish reason of the first candidate, if present.
pub fn finish_reason(body: &Value) -> Option<String> {
    body.get("candidates")?
        .as_array()?
        .first()?
        .get("finishReason")?
        .as_str()
        .map(str::to_string)
}

/// Block reason reported for the prompt, if any.
pub fn block_reason(body: &Value) -> Option<String> {
    body.get("promptFeedback")?
        .get("blockReason")?
        .as_str()
        .map(str::to_string)
}
