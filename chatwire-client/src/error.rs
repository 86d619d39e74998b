//! Internal helpers for classifying failed chat responses into [`StreamError`].

use chatwire::StreamError;
use serde_json::Value;

/// Classify a non-2xx response.
///
/// A JSON body with a truthy `error` field is a backend error; anything
/// else is reported with the status and the raw body. `body` is `None`
/// when the body could not be read.
pub(crate) fn classify_failure(status: u16, body: Option<&str>) -> StreamError {
    let message = match body {
        None => format!("HTTP {status}: unable to read error body"),
        Some(text) => match backend_error(text) {
            Some(error) => format!("backend error: {error}"),
            None if text.is_empty() => format!("HTTP {status}: request failed"),
            None => format!("HTTP {status}: {text}"),
        },
    };
    StreamError::Response { status, message }
}

/// The `error` field of a JSON error body, if present and truthy.
fn backend_error(text: &str) -> Option<String> {
    let json: Value = serde_json::from_str(text).ok()?;
    match json.get("error")? {
        Value::Null | Value::Bool(false) => None,
        Value::String(s) if s.is_empty() => None,
        Value::Number(n) if n.as_f64() == Some(0.0) => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}
