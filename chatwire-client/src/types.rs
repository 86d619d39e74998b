//! Request body for the chat endpoint.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// JSON body posted to the chat endpoint.
///
/// ```text
/// {"message":"Hello","system_message":"You are a helpful assistant.","stream":true}
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChatRequest {
    /// The user's message.
    pub message: String,
    /// Optional system prompt.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_message: Option<String>,
    /// Whether the backend should stream. Always sent as `true`.
    #[serde(default)]
    pub stream: bool,
    /// Backend-specific fields, sent at the top level.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ChatRequest {
    /// A request carrying only a user message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            ..Default::default()
        }
    }

    /// Set the system prompt.
    #[must_use]
    pub fn system_message(mut self, system: impl Into<String>) -> Self {
        self.system_message = Some(system.into());
        self
    }

    /// Add a backend-specific top-level field.
    #[must_use]
    pub fn extra(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }

    /// The body actually sent: streaming forced on.
    pub(crate) fn to_wire(&self) -> Self {
        let mut body = self.clone();
        body.stream = true;
        body.extra.remove("stream");
        body
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn serializes_minimal_request() {
        let value = serde_json::to_value(ChatRequest::new("hi")).unwrap();
        assert_eq!(value, json!({"message": "hi", "stream": false}));
    }

    #[test]
    fn wire_body_forces_streaming() {
        let request = ChatRequest::new("hi")
            .system_message("be brief")
            .extra("stream", false)
            .extra("temperature", 0.2);
        let value = serde_json::to_value(request.to_wire()).unwrap();
        assert_eq!(
            value,
            json!({
                "message": "hi",
                "system_message": "be brief",
                "stream": true,
                "temperature": 0.2
            })
        );
    }

    #[test]
    fn deserializes_with_extra_fields() {
        let request: ChatRequest =
            serde_json::from_value(json!({"message": "hi", "model": "deepseek-chat"})).unwrap();
        assert_eq!(request.message, "hi");
        assert!(!request.stream);
        assert_eq!(request.extra["model"], "deepseek-chat");
    }
}
