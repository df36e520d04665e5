//! Authenticated REST gateway for Sonatype Nexus Repository Manager and Sonatype Firewall.
//!
//! This crate is the single choke point for outbound calls made by `nexus-mcp`:
//! - [`profile::ConnectionProfile`] describes one remote API (URL, credentials, timeout, TLS, mode)
//! - [`client::GatewayClient`] attaches Basic auth, enforces read-only mode and classifies failures
//! - [`error::GatewayError`] is the closed failure taxonomy callers dispatch on
//!
//! It intentionally contains **no** tool definitions and **no** MCP types.

pub mod client;
pub mod error;
pub mod profile;
pub mod redact;

pub use client::GatewayClient;
pub use error::{FailureKind, GatewayError, Result};
pub use profile::ConnectionProfile;
