//! Failure classes for calls against the task service.
//!
//! Two families matter to callers:
//! - Transport: no connectivity, timeout, bad HTTP status, body that is not the
//!   expected JSON envelope
//! - Application: the envelope came back with `status != "success"`

use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("HTTP: {0}")]
    Http(#[from] reqwest::Error),

    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    #[error("unexpected HTTP status {0}")]
    Status(u16),

    #[error("response was not valid JSON: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("response for {action} is missing `{field}`")]
    MissingPayload { action: String, field: &'static str },

    #[error("{}", .message.as_deref().unwrap_or("request rejected by the service"))]
    Application { message: Option<String> },
}

impl ClientError {
    pub fn is_application(&self) -> bool {
        matches!(self, ClientError::Application { .. })
    }

    pub fn remote_message(&self) -> Option<&str> {
        match self {
            ClientError::Application { message } => message.as_deref(),
            _ => None,
        }
    }

    /// Text for the single error notification a failed operation emits.
    ///
    /// `prefix` is prepended to a remote message ("Failed to load tasks");
    /// `fallback` is used when no remote message exists.
    pub fn user_message(&self, prefix: Option<&str>, fallback: &str) -> String {
        match (self.remote_message(), prefix) {
            (Some(message), Some(prefix)) => format!("{prefix}: {message}"),
            (Some(message), None) => message.to_string(),
            (None, _) => fallback.to_string(),
        }
    }
}
