//! Normalized response bodies and the dispatcher's error taxonomy.

use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use thiserror::Error;

/// Body of a response after normalization.
///
/// The body is always read as text first; an empty body is not an error and
/// neither is a body that fails to parse as JSON.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Empty,
    Json(Value),
    /// Non-empty body that is not valid JSON.
    Raw(String),
}

impl Payload {
    pub fn from_text(text: &str) -> Self {
        if text.is_empty() {
            return Payload::Empty;
        }
        match serde_json::from_str(text) {
            Ok(value) => Payload::Json(value),
            Err(_) => Payload::Raw(text.to_string()),
        }
    }

    /// JSON shape handed to JS callers: `null`, the parsed value, or
    /// `{ "raw": text }`.
    pub fn to_value(&self) -> Value {
        match self {
            Payload::Empty => Value::Null,
            Payload::Json(value) => value.clone(),
            Payload::Raw(text) => json!({ "raw": text }),
        }
    }

    pub fn decode<T: DeserializeOwned>(self) -> Result<T, ApiError> {
        serde_json::from_value(self.to_value()).map_err(|e| ApiError::Decode(e.to_string()))
    }

    /// `detail` or `message` field of an error body, when truthy.
    pub fn error_message(&self) -> Option<String> {
        let Payload::Json(Value::Object(map)) = self else {
            return None;
        };
        ["detail", "message"]
            .iter()
            .filter_map(|field| map.get(*field))
            .find(|value| is_truthy(value))
            .map(|value| match value {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            })
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map_or(true, |f| f != 0.0 && !f.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

#[derive(Debug, Error)]
pub enum ApiError {
    /// Transport rejected before any response arrived.
    #[error("network error: {0}")]
    Network(String),
    /// Non-2xx response.
    #[error("{message}")]
    Http { status: u16, message: String, data: Payload },
    /// 2xx response whose body does not match the expected type.
    #[error("unexpected response body: {0}")]
    Decode(String),
    /// Rejected locally, no request was sent.
    #[error("{0}")]
    Invalid(String),
}

impl ApiError {
    pub fn from_status(status: u16, data: Payload) -> Self {
        let message = data.error_message().unwrap_or_else(|| format!("HTTP {}", status));
        ApiError::Http { status, message, data }
    }

    /// HTTP status, absent for network-level failures.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn data(&self) -> Option<&Payload> {
        match self {
            ApiError::Http { data, .. } => Some(data),
            _ => None,
        }
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
