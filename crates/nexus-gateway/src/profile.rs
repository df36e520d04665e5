//! Connection profiles.

use std::fmt;
use std::time::Duration;

/// Default request timeout applied when a profile does not override it.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Health endpoint exposed by Nexus Repository Manager without authentication.
pub const NEXUS_HEALTH_PATH: &str = "/service/rest/v1/status";

/// Health endpoint exposed by Sonatype IQ Server / Firewall without authentication.
pub const FIREWALL_HEALTH_PATH: &str = "/ping";

/// Reachability and identity of one remote service.
///
/// Built once at startup and never mutated afterwards; the gateway client keeps its own copy.
#[derive(Clone)]
pub struct ConnectionProfile {
    name: String,
    base_url: String,
    username: String,
    password: String,
    timeout: Duration,
    skip_tls_verify: bool,
    read_only: bool,
    health_path: String,
}

impl ConnectionProfile {
    /// Start a profile for `base_url` with no credentials, default timeout and TLS validation on.
    ///
    /// A trailing `/` on the URL is dropped so paths can be appended verbatim.
    pub fn new(name: impl Into<String>, base_url: impl Into<String>) -> Self {
        let base_url: String = base_url.into();
        Self {
            name: name.into(),
            base_url: base_url.trim_end_matches('/').to_string(),
            username: String::new(),
            password: String::new(),
            timeout: DEFAULT_TIMEOUT,
            skip_tls_verify: false,
            read_only: false,
            health_path: NEXUS_HEALTH_PATH.to_string(),
        }
    }

    #[must_use]
    pub fn with_credentials(
        mut self,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        self.username = username.into();
        self.password = password.into();
        self
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    #[must_use]
    pub fn with_skip_tls_verify(mut self, skip: bool) -> Self {
        self.skip_tls_verify = skip;
        self
    }

    #[must_use]
    pub fn with_read_only(mut self, read_only: bool) -> Self {
        self.read_only = read_only;
        self
    }

    #[must_use]
    pub fn with_health_path(mut self, path: impl Into<String>) -> Self {
        self.health_path = path.into();
        self
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    #[must_use]
    pub fn username(&self) -> &str {
        &self.username
    }

    #[must_use]
    pub fn password(&self) -> &str {
        &self.password
    }

    #[must_use]
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    #[must_use]
    pub fn skip_tls_verify(&self) -> bool {
        self.skip_tls_verify
    }

    #[must_use]
    pub fn read_only(&self) -> bool {
        self.read_only
    }

    #[must_use]
    pub fn health_path(&self) -> &str {
        &self.health_path
    }

    /// Both username and password are non-empty.
    #[must_use]
    pub fn has_credentials(&self) -> bool {
        !self.username.is_empty() && !self.password.is_empty()
    }
}

impl fmt::Debug for ConnectionProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionProfile")
            .field("name", &self.name)
            .field("base_url", &self.base_url)
            .field("username", &self.username)
            .field("password", &if self.password.is_empty() { "" } else { "***" })
            .field("timeout", &self.timeout)
            .field("skip_tls_verify", &self.skip_tls_verify)
            .field("read_only", &self.read_only)
            .field("health_path", &self.health_path)
            .finish()
    }
}
