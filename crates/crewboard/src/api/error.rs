use std::collections::BTreeMap;

use serde_json::Value;

/// Failure surfaced by a backend call.
///
/// `status` is `None` when the request never produced a response. `data` holds the parsed
/// JSON error body when the backend sent one, e.g. `{"detail": "..."}` or field errors.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{message}")]
pub struct ApiError {
    pub status: Option<u16>,
    pub data: Option<Value>,
    pub message: String,
}

/// Coarse grouping used by callers to pick a presentation (retry button, field message, modal).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    Transport,
    Unauthorized,
    NotFound,
    Validation,
    BusinessRule,
    Decode,
    Server,
}

impl ApiError {
    pub fn http(status: u16, data: Option<Value>) -> Self {
        let message = data
            .as_ref()
            .and_then(detail_of)
            .unwrap_or_else(|| format!("request failed with status {status}"));
        Self {
            status: Some(status),
            data,
            message,
        }
    }

    pub fn transport(message: impl Into<String>) -> Self {
        Self {
            status: None,
            data: None,
            message: message.into(),
        }
    }

    pub fn decode(status: u16, message: impl Into<String>) -> Self {
        Self {
            status: Some(status),
            data: None,
            message: format!("unexpected response body: {}", message.into()),
        }
    }

    /// The backend's `detail` string when present, otherwise the generic message.
    pub fn detail(&self) -> &str {
        self.data
            .as_ref()
            .and_then(|data| data.get("detail"))
            .and_then(Value::as_str)
            .unwrap_or(&self.message)
    }

    /// Field-level validation messages, keyed by field name.
    pub fn field_errors(&self) -> BTreeMap<String, Vec<String>> {
        let Some(Value::Object(fields)) = &self.data else {
            return BTreeMap::new();
        };

        fields
            .iter()
            .filter(|(name, _)| name.as_str() != "detail")
            .filter_map(|(name, value)| {
                let messages: Vec<String> = match value {
                    Value::String(message) => vec![message.clone()],
                    Value::Array(items) => items
                        .iter()
                        .filter_map(Value::as_str)
                        .map(str::to_string)
                        .collect(),
                    _ => Vec::new(),
                };
                (!messages.is_empty()).then(|| (name.clone(), messages))
            })
            .collect()
    }

    pub fn class(&self) -> ErrorClass {
        let Some(status) = self.status else {
            return ErrorClass::Transport;
        };

        match status {
            200..=299 => ErrorClass::Decode,
            401 | 403 => ErrorClass::Unauthorized,
            404 => ErrorClass::NotFound,
            400 | 409 | 422 if !self.field_errors().is_empty() => ErrorClass::Validation,
            400 | 409 | 422 => ErrorClass::BusinessRule,
            _ => ErrorClass::Server,
        }
    }

    /// Text suitable for a modal or inline message.
    pub fn user_message(&self) -> String {
        if self.class() == ErrorClass::Validation {
            if let Some((field, messages)) = self.field_errors().into_iter().next() {
                return format!("{field}: {}", messages.join(" "));
            }
        }
        self.detail().to_string()
    }
}

fn detail_of(data: &Value) -> Option<String> {
    data.get("detail").and_then(Value::as_str).map(str::to_string)
}

impl From<reqwest::Error> for ApiError {
    fn from(value: reqwest::Error) -> Self {
        match value.status() {
            Some(status) => ApiError::http(status.as_u16(), None),
            None => ApiError::transport(value.to_string()),
        }
    }
}
