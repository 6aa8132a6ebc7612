use std::time::Duration;

use reqwest::StatusCode;
use thiserror::Error;

/// Failures surfaced by [`crate::api::ApiClient`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    #[error("No internet connection. Please check your network.")]
    Offline,

    #[error("Invalid API configuration: missing {}. Please check your settings.", .missing.join(", "))]
    Config { missing: Vec<&'static str> },

    #[error("Authentication failed. Please check your API key.")]
    Auth,

    #[error("API endpoint not found. Please check the base URL.")]
    NotFound,

    #[error("API error: {status} - {status_text}{}", detail_suffix(.detail))]
    Status {
        status: u16,
        status_text: String,
        detail: Option<String>,
    },

    #[error("No response from server ({0}). Please try again later.")]
    Network(String),

    #[error("Request timed out after {}s. Please try again later.", .0.as_secs())]
    Timeout(Duration),

    #[error("Unexpected response from server: {0}")]
    InvalidResponse(String),
}

fn detail_suffix(detail: &Option<String>) -> String {
    match detail {
        Some(detail) if !detail.is_empty() => format!(" ({detail})"),
        _ => String::new(),
    }
}

impl ApiError {
    /// Map a non-success HTTP status (and its body) into the taxonomy.
    pub fn from_status(status: StatusCode, body: &str) -> Self {
        match status {
            StatusCode::UNAUTHORIZED => ApiError::Auth,
            StatusCode::NOT_FOUND => ApiError::NotFound,
            other => ApiError::Status {
                status: other.as_u16(),
                status_text: other.canonical_reason().unwrap_or("Unknown").to_string(),
                detail: extract_error_summary(body),
            },
        }
    }

    /// Map a transport failure, given the budget the request ran under.
    pub fn from_transport(err: reqwest::Error, budget: Duration) -> Self {
        if err.is_timeout() {
            ApiError::Timeout(budget)
        } else if err.is_decode() {
            ApiError::InvalidResponse(err.to_string())
        } else {
            ApiError::Network(transport_reason(&err))
        }
    }
}

fn transport_reason(err: &reqwest::Error) -> String {
    if err.is_connect() {
        "connection failed".to_string()
    } else if err.is_body() {
        "response body interrupted".to_string()
    } else if err.is_request() {
        "request failed".to_string()
    } else {
        err.to_string()
    }
}

/// A one-line summary of an error body, when it carries one.
///
/// Understands `{"error":{"message":..}}`, `{"error":".."}` and
/// `{"message":..}`; plain-text bodies are used as-is.
pub fn extract_error_summary(body: &str) -> Option<String> {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return None;
    }

    let summary = match serde_json::from_str::<serde_json::Value>(trimmed) {
        Ok(value) => value
            .pointer("/error/message")
            .and_then(|v| v.as_str())
            .or_else(|| value.get("error").and_then(|v| v.as_str()))
            .or_else(|| value.get("message").and_then(|v| v.as_str()))
            .map(str::to_owned)?,
        Err(_) if trimmed.starts_with('<') => return None,
        Err(_) => trimmed.to_string(),
    };

    let collapsed = summary.split_whitespace().collect::<Vec<_>>().join(" ");
    (!collapsed.is_empty()).then_some(collapsed)
}
