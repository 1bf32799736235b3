//! Turning failure bodies into a single display string.

use serde_json::Value;

/// Message used when a failure body carries nothing printable.
pub const FALLBACK_MESSAGE: &str = "Request failed";

/// Extract a human-readable message from a failure body.
///
/// The service reports failures as `{"detail": ...}` where `detail` is
/// either a plain string or an object with an `error` or `message` field.
/// Only string values are ever returned, so a nested object can never end
/// up rendered as its debug form.
pub fn extract_error_message(body: &Value) -> String {
    match body.get("detail") {
        Some(Value::String(detail)) => detail.clone(),
        Some(Value::Object(detail)) => ["error", "message"]
            .iter()
            .filter_map(|key| detail.get(*key).and_then(Value::as_str))
            .find(|s| !s.is_empty())
            .unwrap_or(FALLBACK_MESSAGE)
            .to_string(),
        _ => FALLBACK_MESSAGE.to_string(),
    }
}
