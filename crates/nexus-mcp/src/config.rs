//! Command-line / environment configuration.
//!
//! Everything is parsed once at startup into [`Settings`], which is then handed to the
//! collaborators that need it. There is no process-wide configuration state.

use crate::error::ConfigError;
use clap::{Parser, ValueEnum};
use nexus_gateway::ConnectionProfile;
use nexus_gateway::profile::{FIREWALL_HEALTH_PATH, NEXUS_HEALTH_PATH};
use reqwest::Url;
use std::collections::BTreeSet;
use std::time::Duration;

#[derive(Parser, Debug, Clone)]
#[command(name = "nexus-mcp", version, about, long_about = None)]
pub struct Cli {
    /// Nexus Repository Manager base URL
    #[arg(long, env = "NEXUS_URL", default_value = "http://localhost:8081")]
    pub nexus_url: String,

    /// Nexus username (Basic auth)
    #[arg(long, env = "NEXUS_USERNAME", default_value = "")]
    pub nexus_username: String,

    /// Nexus password (Basic auth)
    #[arg(long, env = "NEXUS_PASSWORD", default_value = "", hide_env_values = true)]
    pub nexus_password: String,

    /// Sonatype Firewall / IQ Server base URL (Firewall tools are disabled when unset)
    #[arg(long, env = "FIREWALL_URL")]
    pub firewall_url: Option<String>,

    /// Firewall username (Basic auth)
    #[arg(long, env = "FIREWALL_USERNAME", default_value = "")]
    pub firewall_username: String,

    /// Firewall password (Basic auth)
    #[arg(long, env = "FIREWALL_PASSWORD", default_value = "", hide_env_values = true)]
    pub firewall_password: String,

    /// Per-request timeout in seconds
    #[arg(long, env = "NEXUS_TIMEOUT_SECS", default_value_t = 30)]
    pub timeout_secs: u64,

    /// Accept invalid TLS certificates
    #[arg(long, env = "NEXUS_SKIP_TLS_VERIFY")]
    pub skip_tls_verify: bool,

    /// Reject every mutating call before it is sent
    #[arg(long, env = "NEXUS_READ_ONLY")]
    pub read_only: bool,

    /// Comma-separated allow-list of tool names (default: all tools)
    #[arg(long, env = "NEXUS_MCP_TOOLS", value_delimiter = ',')]
    pub tools: Vec<String>,

    /// Log level / filter directive (`RUST_LOG` takes precedence when set)
    #[arg(long, env = "NEXUS_MCP_LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// Log output format
    #[arg(long, env = "NEXUS_MCP_LOG_FORMAT", value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
}

/// Validated startup configuration.
#[derive(Debug, Clone)]
pub struct Settings {
    pub nexus: ConnectionProfile,
    pub firewall: Option<ConnectionProfile>,
    /// `None` registers every available tool.
    pub tool_allowlist: Option<BTreeSet<String>>,
}

impl Cli {
    /// Validate and convert into [`Settings`].
    ///
    /// Missing credentials are not an error here: they are reported at startup and every
    /// authenticated call then fails with a configuration failure.
    ///
    /// # Errors
    ///
    /// Returns an error if a URL is not an absolute `http(s)` URL or the timeout is zero.
    pub fn into_settings(self) -> Result<Settings, ConfigError> {
        if self.timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                setting: "--timeout-secs",
                reason: "must be greater than zero".to_string(),
            });
        }
        let timeout = Duration::from_secs(self.timeout_secs);

        validate_url("--nexus-url", &self.nexus_url)?;
        let nexus = ConnectionProfile::new("nexus", self.nexus_url)
            .with_credentials(self.nexus_username, self.nexus_password)
            .with_timeout(timeout)
            .with_skip_tls_verify(self.skip_tls_verify)
            .with_read_only(self.read_only)
            .with_health_path(NEXUS_HEALTH_PATH);

        let firewall = match self.firewall_url.filter(|u| !u.trim().is_empty()) {
            Some(url) => {
                validate_url("--firewall-url", &url)?;
                Some(
                    ConnectionProfile::new("firewall", url)
                        .with_credentials(self.firewall_username, self.firewall_password)
                        .with_timeout(timeout)
                        .with_skip_tls_verify(self.skip_tls_verify)
                        .with_read_only(self.read_only)
                        .with_health_path(FIREWALL_HEALTH_PATH),
                )
            }
            None => None,
        };

        let allow: BTreeSet<String> = self
            .tools
            .iter()
            .map(|t| t.trim())
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .collect();

        Ok(Settings {
            nexus,
            firewall,
            tool_allowlist: (!allow.is_empty()).then_some(allow),
        })
    }
}

fn validate_url(setting: &'static str, value: &str) -> Result<(), ConfigError> {
    let invalid = |reason: String| ConfigError::InvalidUrl {
        setting,
        value: value.to_string(),
        reason,
    };
    let url = Url::parse(value).map_err(|e| invalid(e.to_string()))?;
    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(invalid(format!("unsupported scheme '{}'", url.scheme())));
    }
    Ok(())
}
