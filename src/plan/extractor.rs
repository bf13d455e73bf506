//! Plan Extractor
//!
//! Recovers one JSON object from generated text. Strategies run from most
//! precise to most permissive:
//! 1. strict parse of the (fence-stripped) text
//! 2. parse of the span between the first `{` and the last `}`

use crate::error::{AgentError, Result};
use serde_json::Value;
use tracing::debug;

const FENCE: &str = "```";

/// Remove markdown code-fence lines when the text opens with a fence.
pub fn strip_code_fences(text: &str) -> String {
    let trimmed = text.trim();
    if !trimmed.starts_with(FENCE) {
        return trimmed.to_string();
    }
    trimmed
        .lines()
        .filter(|line| !line.trim().starts_with(FENCE))
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}

/// Extract the JSON object embedded in `text`.
pub fn extract_json_object(text: &str) -> Result<Value> {
    if text.trim().is_empty() {
        return Err(extraction_error("Generated text is empty", text));
    }

    let cleaned = strip_code_fences(text);

    if let Ok(value @ Value::Object(_)) = serde_json::from_str::<Value>(&cleaned) {
        return Ok(value);
    }
    debug!("Strict JSON parse failed, falling back to brace-bounded extraction");

    let (start, end) = match (cleaned.find('{'), cleaned.rfind('}')) {
        (Some(start), Some(end)) if start < end => (start, end),
        _ => return Err(extraction_error("No JSON object found in generated text", text)),
    };

    match serde_json::from_str::<Value>(&cleaned[start..=end]) {
        Ok(value @ Value::Object(_)) => Ok(value),
        Ok(_) => Err(extraction_error("Generated JSON is not an object", text)),
        Err(e) => Err(extraction_error(&format!("Generated JSON is malformed: {}", e), text)),
    }
}

fn extraction_error(message: &str, raw: &str) -> AgentError {
    AgentError::Extraction {
        message: message.to_string(),
        raw: raw.to_string(),
    }
}
