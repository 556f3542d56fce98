use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// The request never produced a response.
    Transport,
    /// A response arrived with a non-success status.
    Http,
    /// Rejected locally before any request was sent.
    Validation,
    /// A success response whose body could not be parsed.
    Decode,
}

#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[error("{message}")]
pub struct ApiError {
    pub kind: ErrorKind,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

pub type ApiResult<T> = std::result::Result<T, ApiError>;

impl ApiError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            status: None,
            details: None,
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Validation, message)
    }

    pub fn transport(operation: &str, err: &reqwest::Error) -> Self {
        let mut out = Self::new(ErrorKind::Transport, format!("Failed to {operation}: {err}"));
        out.status = err.status().map(|s| s.as_u16());
        out
    }

    pub fn decode(operation: &str, err: impl std::fmt::Display) -> Self {
        Self::new(
            ErrorKind::Decode,
            format!("Failed to {operation}: unexpected response ({err})"),
        )
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    /// Builds an error from a non-success response body.
    ///
    /// A JSON object contributes `message` (or `error`, or `msg`) and `details`; any
    /// other body is used verbatim, and an empty body yields a generic
    /// message naming the operation and status.
    pub fn from_http(operation: &str, status: u16, body: &str) -> Self {
        let generic = || format!("Failed to {operation} (status {status})");
        let trimmed = body.trim();

        let (message, details) = match serde_json::from_str::<Value>(trimmed) {
            Ok(Value::Object(map)) => {
                let message = ["message", "error", "msg"]
                    .iter()
                    .find_map(|key| map.get(*key).and_then(non_empty_str))
                    .map(str::to_string)
                    .unwrap_or_else(generic);
                let details = map.get("details").and_then(|d| match d {
                    Value::Null => None,
                    Value::String(s) if s.trim().is_empty() => None,
                    Value::String(s) => Some(s.clone()),
                    other => Some(other.to_string()),
                });
                (message, details)
            }
            Ok(Value::String(s)) if !s.trim().is_empty() => (s, None),
            _ if !trimmed.is_empty() => (trimmed.to_string(), None),
            _ => (generic(), None),
        };

        Self {
            kind: ErrorKind::Http,
            message,
            status: Some(status),
            details,
        }
    }

    pub fn is_validation(&self) -> bool {
        self.kind == ErrorKind::Validation
    }
}

fn non_empty_str(value: &Value) -> Option<&str> {
    value.as_str().filter(|s| !s.trim().is_empty())
}
