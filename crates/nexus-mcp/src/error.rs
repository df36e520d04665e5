//! Error types for the MCP server.

use nexus_gateway::{FailureKind, GatewayError};
use thiserror::Error;

/// Startup configuration errors (invalid flags or environment values).
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration error: invalid URL for {setting} '{value}': {reason}")]
    InvalidUrl {
        setting: &'static str,
        value: String,
        reason: String,
    },

    #[error("Configuration error: invalid value for {setting}: {reason}")]
    InvalidValue {
        setting: &'static str,
        reason: String,
    },
}

/// Failure of a single tool invocation, rendered back to the caller as an error result.
#[derive(Error, Debug)]
pub enum ToolError {
    /// Arguments failed schema or semantic validation; nothing was sent upstream.
    #[error("Invalid arguments for '{tool}': {reason}")]
    InvalidArguments { tool: String, reason: String },

    /// The gateway classified the upstream outcome as a failure.
    #[error(transparent)]
    Gateway(#[from] GatewayError),

    /// Upstream answered successfully but with a shape the tool cannot work with.
    #[error("Unexpected response from {service}: {reason}")]
    UnexpectedResponse { service: String, reason: String },
}

impl ToolError {
    pub fn invalid(tool: &str, reason: impl Into<String>) -> Self {
        Self::InvalidArguments {
            tool: tool.to_string(),
            reason: reason.into(),
        }
    }

    /// Failure kind callers dispatch on.
    #[must_use]
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::InvalidArguments { .. } => FailureKind::Validation,
            Self::Gateway(e) => e.kind(),
            Self::UnexpectedResponse { .. } => FailureKind::Unknown,
        }
    }

    /// Upstream HTTP status, `0` when none was involved.
    #[must_use]
    pub fn status(&self) -> u16 {
        match self {
            Self::Gateway(e) => e.status(),
            Self::InvalidArguments { .. } | Self::UnexpectedResponse { .. } => 0,
        }
    }
}

/// Result type alias for tool handlers.
pub type ToolResult<T> = std::result::Result<T, ToolError>;
