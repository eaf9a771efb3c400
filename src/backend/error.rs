use serde::Deserialize;
use thiserror::Error;

/// Failures of a single backend call.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BackendError {
    /// The request never produced a response (connection refused, DNS, timeout)
    #[error("Network error: {0}")]
    Transport(String),

    /// Non-2xx status, with the server's `detail` when the body carried one
    #[error("HTTP {status}: {}", .detail.as_deref().unwrap_or("no error detail"))]
    Http { status: u16, detail: Option<String> },

    /// 2xx response whose body did not match the expected shape
    #[error("Unexpected response: {0}")]
    Decode(String),
}

impl BackendError {
    /// Text shown to the user: the structured detail when the server sent
    /// one, the caller's fallback for bare HTTP failures.
    pub fn user_message(&self, fallback: &str) -> String {
        match self {
            BackendError::Http { detail: Some(detail), .. } => detail.clone(),
            BackendError::Http { .. } => fallback.to_string(),
            BackendError::Transport(msg) | BackendError::Decode(msg) => msg.clone(),
        }
    }

    /// Builds an HTTP error from a raw response body, tolerating empty or
    /// non-JSON bodies.
    pub fn from_response_body(status: u16, body: &str) -> Self {
        let detail = serde_json::from_str::<ErrorBody>(body)
            .ok()
            .and_then(|b| b.detail)
            .map(|d| d.flatten())
            .filter(|d| !d.is_empty());

        BackendError::Http { status, detail }
    }
}

impl From<reqwest::Error> for BackendError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            BackendError::Decode(err.to_string())
        } else {
            BackendError::Transport(err.to_string())
        }
    }
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    detail: Option<ErrorDetail>,
}

/// `detail` is either a plain message or a list of field validation issues.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum ErrorDetail {
    Message(String),
    Validation(Vec<ValidationIssue>),
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ValidationIssue {
    #[serde(default)]
    pub loc: Vec<serde_json::Value>,
    pub msg: String,
}

impl ValidationIssue {
    fn location(&self) -> String {
        self.loc
            .iter()
            .map(|part| match part {
                serde_json::Value::String(s) => s.clone(),
                other => other.to_string(),
            })
            .collect::<Vec<_>>()
            .join(" -> ")
    }
}

impl ErrorDetail {
    /// Single human-readable line; validation issues become
    /// `location: message` pairs joined by `"; "`.
    pub fn flatten(&self) -> String {
        match self {
            ErrorDetail::Message(msg) => msg.clone(),
            ErrorDetail::Validation(issues) => issues
                .iter()
                .map(|issue| {
                    let location = issue.location();
                    if location.is_empty() {
                        issue.msg.clone()
                    } else {
                        format!("{}: {}", location, issue.msg)
                    }
                })
                .collect::<Vec<_>>()
                .join("; "),
        }
    }
}
