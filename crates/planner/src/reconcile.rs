//! Turn raw model text into a validated [`TravelGuideDocument`].
//!
//! Models answer in one of two shapes: the document itself, or the
//! document serialized as a string inside a single-field envelope such as
//! `{"output": "{...}"}`. Exactly one envelope level is unwrapped.
//! Syntax failures become [`GuideError::MalformedOutput`]; well-formed JSON
//! with the wrong shape becomes [`GuideError::SchemaViolation`].

use serde_json::Value;
use travelguide_core::error::GuideError;
use travelguide_core::guide::TravelGuideDocument;

/// Field names recognised as a string-encoded envelope.
const ENVELOPE_KEYS: [&str; 3] = ["output", "response", "result"];

/// Characters of raw output kept in a `MalformedOutput` error.
const EXCERPT_CHARS: usize = 200;

pub fn reconcile(raw: &str) -> Result<TravelGuideDocument, GuideError> {
    let text = raw.trim();
    if !text.starts_with('{') {
        return Err(malformed(text, "output is not a JSON object"));
    }

    let value: Value =
        serde_json::from_str(text).map_err(|e| malformed(text, &e.to_string()))?;

    let value = match envelope_payload(&value) {
        Some((key, inner)) => {
            let inner = inner.trim();
            if !inner.starts_with('{') {
                return Err(malformed(
                    inner,
                    &format!("\"{key}\" envelope does not contain a JSON object"),
                ));
            }
            let unwrapped: Value =
                serde_json::from_str(inner).map_err(|e| malformed(inner, &e.to_string()))?;
            if envelope_payload(&unwrapped).is_some() {
                return Err(GuideError::SchemaViolation(
                    "output is wrapped in more than one envelope".into(),
                ));
            }
            unwrapped
        }
        None => value,
    };

    let document: TravelGuideDocument =
        serde_json::from_value(value).map_err(|e| GuideError::SchemaViolation(e.to_string()))?;
    document.validate()?;
    Ok(document)
}

/// `Some((key, payload))` when `value` is a single-field object whose key
/// is an envelope name and whose value is a string.
fn envelope_payload(value: &Value) -> Option<(&str, &str)> {
    let object = value.as_object()?;
    if object.len() != 1 {
        return None;
    }
    let (key, payload) = object.iter().next()?;
    if !ENVELOPE_KEYS.contains(&key.as_str()) {
        return None;
    }
    Some((key.as_str(), payload.as_str()?))
}

fn malformed(text: &str, reason: &str) -> GuideError {
    GuideError::MalformedOutput {
        reason: reason.to_string(),
        excerpt: text.chars().take(EXCERPT_CHARS).collect(),
    }
}
