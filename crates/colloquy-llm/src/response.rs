use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// Why a completion failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompletionErrorKind {
    /// Connection error, timeout or non-2xx status
    Transport,
    /// Body was not JSON or had an unrecognized shape
    Parse,
    /// Well-formed 2xx body without any completion text
    NoCompletion,
    /// Provider reported an `error` object
    Api,
}

/// Provider-agnostic result of one completion call
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NormalizedResponse {
    pub success: bool,
    pub content: String,
    pub error_kind: Option<CompletionErrorKind>,
    pub error_message: String,
    pub http_status: u16,
    pub metadata: HashMap<String, String>,
}

impl NormalizedResponse {
    pub fn success(content: impl Into<String>) -> Self {
        Self {
            success: true,
            content: content.into(),
            ..Self::default()
        }
    }

    pub fn failure(kind: CompletionErrorKind, message: impl Into<String>) -> Self {
        Self {
            success: false,
            error_kind: Some(kind),
            error_message: message.into(),
            ..Self::default()
        }
    }

    pub fn with_metadata(mut self, metadata: HashMap<String, String>) -> Self {
        self.metadata = metadata;
        self
    }

    pub fn with_http_status(mut self, status: u16) -> Self {
        self.http_status = status;
        self
    }
}

/// Message of a provider `error` field, if the body carries one.
///
/// Accepts `{"error": "text"}` and `{"error": {"message": "text"}}`; any
/// other non-null value is reported verbatim.
pub(crate) fn api_error(value: &Value) -> Option<String> {
    match value.get("error")? {
        Value::Null => None,
        Value::String(message) => Some(message.clone()),
        other => Some(
            other
                .get("message")
                .and_then(Value::as_str)
                .map(str::to_string)
                .unwrap_or_else(|| other.to_string()),
        ),
    }
}

/// Copy `usage.<key>` entries into a string map
pub(crate) fn usage_metadata(value: &Value, keys: &[&str]) -> HashMap<String, String> {
    let mut metadata = HashMap::new();
    let Some(usage) = value.get("usage") else {
        return metadata;
    };
    for key in keys {
        match usage.get(*key) {
            Some(Value::String(s)) => {
                metadata.insert(key.to_string(), s.clone());
            }
            Some(Value::Number(n)) => {
                metadata.insert(key.to_string(), n.to_string());
            }
            _ => {}
        }
    }
    metadata
}

pub(crate) fn parse_json(body: &str) -> Result<Value, NormalizedResponse> {
    serde_json::from_str(body).map_err(|e| {
        NormalizedResponse::failure(
            CompletionErrorKind::Parse,
            format!("Failed to parse JSON response: {}", e),
        )
    })
}
