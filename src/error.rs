use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Failure of a single Constant Contact API operation.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// A non-2xx response was received.
    #[error("Constant Contact API Error ({}){}", .status.as_u16(), detail_suffix(.message))]
    Upstream {
        status: StatusCode,
        message: Option<String>,
    },
    /// The request went out but no response came back.
    #[error("No response from Constant Contact API: {0}")]
    NoResponse(String),
    #[error("{0}")]
    Other(String),
}

fn detail_suffix(message: &Option<String>) -> String {
    match message {
        Some(m) if !m.is_empty() => format!(": {}", m),
        _ => String::new(),
    }
}

// Stable error shape surfaced to tool callers.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorInfo {
    pub code: String,
    pub message: String,
    pub retriable: bool,
}

impl ApiError {
    pub fn upstream(status: StatusCode, body: &str) -> Self {
        ApiError::Upstream {
            status,
            message: extract_error_message(body),
        }
    }

    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ApiError::Upstream { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            ApiError::Upstream { status, .. } => status_code_name(*status),
            ApiError::NoResponse(_) => "no_response",
            ApiError::Other(_) => "other",
        }
    }

    pub fn retriable(&self) -> bool {
        match self {
            ApiError::Upstream { status, .. } => {
                *status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
            }
            ApiError::NoResponse(_) => true,
            ApiError::Other(_) => false,
        }
    }

    pub fn info(&self) -> ErrorInfo {
        ErrorInfo {
            code: self.code().to_string(),
            message: self.to_string(),
            retriable: self.retriable(),
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_builder() {
            ApiError::Other(e.to_string())
        } else {
            ApiError::NoResponse(e.to_string())
        }
    }
}

pub fn status_code_name(status: StatusCode) -> &'static str {
    match status {
        StatusCode::BAD_REQUEST => "bad_request",
        StatusCode::UNAUTHORIZED => "unauthorized",
        StatusCode::FORBIDDEN => "forbidden",
        StatusCode::NOT_FOUND => "not_found",
        StatusCode::CONFLICT => "conflict",
        StatusCode::TOO_MANY_REQUESTS => "rate_limited",
        s if s.is_server_error() => "upstream_error",
        _ => "server_error",
    }
}

/// Pull a human-readable message out of an error body.
///
/// Constant Contact answers errors either as an object or as an array of
/// objects carrying `error_message` / `error_key`. Unstructured bodies are
/// used verbatim; an empty body yields `None`.
pub fn extract_error_message(body: &str) -> Option<String> {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return None;
    }
    if let Ok(v) = serde_json::from_str::<Value>(trimmed) {
        let obj = match &v {
            Value::Array(items) => items.first(),
            other => Some(other),
        };
        if let Some(obj) = obj {
            for key in ["error_message", "error_key"] {
                if let Some(s) = obj.get(key).and_then(|m| m.as_str()) {
                    return Some(s.to_string());
                }
            }
        }
    }
    Some(trimmed.to_string())
}
