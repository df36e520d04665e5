//! Classified failures produced by the gateway client.

use serde::Serialize;
use serde_json::Value;
use std::fmt;
use thiserror::Error;

const UNKNOWN_API_ERROR: &str = "Unknown API error";

/// Closed failure taxonomy. Callers dispatch on this, never on message text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// Missing or invalid connection profile fields, detected before any call.
    Configuration,
    /// No response was received (connection refused, DNS failure, timeout).
    Network,
    /// 401/403 from upstream, or a mutating call attempted in read-only mode.
    Authentication,
    NotFound,
    /// Any other 4xx.
    Validation,
    /// 5xx and anything else >= 400 not covered above.
    Server,
    Unknown,
}

impl FailureKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Configuration => "configuration",
            Self::Network => "network",
            Self::Authentication => "authentication",
            Self::NotFound => "not_found",
            Self::Validation => "validation",
            Self::Server => "server",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A failed gateway call, normalized into [`FailureKind`].
///
/// `status` is `0` whenever no HTTP response was involved.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct GatewayError {
    kind: FailureKind,
    message: String,
    status: u16,
    body: Option<Value>,
}

pub type Result<T> = std::result::Result<T, GatewayError>;

impl GatewayError {
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            status: 0,
            body: None,
        }
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::new(FailureKind::Configuration, message)
    }

    pub fn network(message: impl Into<String>) -> Self {
        let message: String = message.into();
        Self::new(FailureKind::Network, format!("Network error: {message}"))
    }

    pub fn unknown(message: impl Into<String>) -> Self {
        Self::new(FailureKind::Unknown, message)
    }

    /// A mutating call was attempted against a read-only profile.
    #[must_use]
    pub fn read_only(service: &str) -> Self {
        Self::new(
            FailureKind::Authentication,
            format!("Operation not permitted: {service} is configured in read-only mode"),
        )
    }

    /// Credentials are required but the profile has none.
    #[must_use]
    pub fn missing_credentials(service: &str) -> Self {
        Self::configuration(format!(
            "Missing credentials for {service}: username and password must both be set"
        ))
    }

    /// Classify an HTTP response with status >= 400.
    #[must_use]
    pub fn from_status(status: u16, body: Option<Value>) -> Self {
        let upstream = body
            .as_ref()
            .and_then(upstream_message)
            .unwrap_or_else(|| UNKNOWN_API_ERROR.to_string());

        let (kind, message) = match status {
            401 => (
                FailureKind::Authentication,
                format!("Authentication failed: {upstream}"),
            ),
            403 => (FailureKind::Authentication, format!("Access denied: {upstream}")),
            404 => (
                FailureKind::NotFound,
                format!("Resource not found: {upstream}"),
            ),
            400..=499 => (FailureKind::Validation, format!("Client error: {upstream}")),
            _ => (FailureKind::Server, format!("Server error: {upstream}")),
        };

        Self {
            kind,
            message,
            status,
            body,
        }
    }

    #[must_use]
    pub fn kind(&self) -> FailureKind {
        self.kind
    }

    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    #[must_use]
    pub fn status(&self) -> u16 {
        self.status
    }

    /// Upstream response body, when one was received.
    #[must_use]
    pub fn body(&self) -> Option<&Value> {
        self.body.as_ref()
    }
}

/// Pull a human message out of an upstream error body.
///
/// Nexus validation errors come back as `[{"id": "...", "message": "..."}]`.
fn upstream_message(body: &Value) -> Option<String> {
    let obj = match body {
        Value::Object(_) => body,
        Value::Array(items) => items.first()?,
        _ => return None,
    };
    ["message", "error"]
        .iter()
        .filter_map(|k| obj.get(*k))
        .find_map(|v| match v {
            Value::String(s) if !s.is_empty() => Some(s.clone()),
            Value::Null | Value::String(_) => None,
            other => Some(other.to_string()),
        })
}
