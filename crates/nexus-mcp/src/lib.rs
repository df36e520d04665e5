//! MCP server exposing Sonatype Nexus Repository Manager (and optionally Sonatype Firewall)
//! operations as tools.
//!
//! Outbound calls all go through [`nexus_gateway::GatewayClient`]; this crate owns the tool
//! surface, configuration, logging and the stdio transport.

pub mod config;
pub mod error;
pub mod logging;
pub mod server;
pub mod tools;
