//! Gateway client: one base URL, one credential pair, one timeout, one read-only flag.
//!
//! Every call goes through [`GatewayClient::send`], which enforces the pre-dispatch gates
//! (read-only mode, credentials) and classifies the outcome into a [`GatewayError`].

use crate::error::{GatewayError, Result};
use crate::profile::ConnectionProfile;
use crate::redact::{redact_url, sanitize_reqwest_error};
use reqwest::header::HeaderMap;
use reqwest::{Client, Method};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, warn};
use url::Url;

#[derive(Clone)]
pub struct GatewayClient {
    inner: Arc<GatewayClientInner>,
}

struct GatewayClientInner {
    profile: ConnectionProfile,
    http: Client,
}

impl GatewayClient {
    /// Build a client for `profile`.
    ///
    /// Missing credentials do not fail construction: the unauthenticated [`probe`](Self::probe)
    /// must still work, so every authenticated call checks them instead.
    ///
    /// # Errors
    ///
    /// Returns a `Configuration` failure if the base URL is not an absolute `http(s)` URL or the
    /// HTTP client cannot be built for the requested TLS policy.
    pub fn new(profile: ConnectionProfile) -> Result<Self> {
        let base = Url::parse(profile.base_url()).map_err(|e| {
            GatewayError::configuration(format!(
                "Invalid base URL '{}' for {}: {e}",
                profile.base_url(),
                profile.name()
            ))
        })?;
        if base.scheme() != "http" && base.scheme() != "https" {
            return Err(GatewayError::configuration(format!(
                "Invalid base URL '{}' for {}: unsupported scheme '{}'",
                profile.base_url(),
                profile.name(),
                base.scheme()
            )));
        }

        let http = Client::builder()
            .timeout(profile.timeout())
            .danger_accept_invalid_certs(profile.skip_tls_verify())
            .user_agent(concat!("nexus-mcp/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| {
                GatewayError::configuration(format!(
                    "Failed to build HTTP client for {}: {}",
                    profile.name(),
                    sanitize_reqwest_error(&e)
                ))
            })?;

        Ok(Self {
            inner: Arc::new(GatewayClientInner { profile, http }),
        })
    }

    #[must_use]
    pub fn name(&self) -> &str {
        self.inner.profile.name()
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        self.inner.profile.base_url()
    }

    #[must_use]
    pub fn is_read_only(&self) -> bool {
        self.inner.profile.read_only()
    }

    /// Unauthenticated reachability check against the profile's health path.
    ///
    /// Never fails: transport errors and non-2xx statuses both report `false`.
    pub async fn probe(&self) -> bool {
        let url = match self.url(self.inner.profile.health_path()) {
            Ok(url) => url,
            Err(e) => {
                debug!(service = %self.name(), error = %e, "probe skipped");
                return false;
            }
        };

        debug!(service = %self.name(), url = %redact_url(&url), "probe request");
        match self.inner.http.get(url).send().await {
            Ok(resp) => {
                let status = resp.status();
                debug!(
                    service = %self.name(),
                    status = status.as_u16(),
                    reason = status.canonical_reason().unwrap_or("Unknown"),
                    "probe response"
                );
                status.is_success()
            }
            Err(e) => {
                debug!(service = %self.name(), error = %sanitize_reqwest_error(&e), "probe failed");
                false
            }
        }
    }

    /// Fail with an `Authentication` failure when the profile is read-only.
    ///
    /// # Errors
    ///
    /// Returns an error if the profile is in read-only mode.
    pub fn ensure_writable(&self) -> Result<()> {
        if self.is_read_only() {
            warn!(service = %self.name(), "mutating call rejected in read-only mode");
            return Err(GatewayError::read_only(self.name()));
        }
        Ok(())
    }

    /// Authenticated read.
    ///
    /// # Errors
    ///
    /// Returns a classified failure if credentials are missing, no response was received, or
    /// the upstream answered with a status >= 400.
    pub async fn get(&self, path: &str, query: &[(&str, String)]) -> Result<Value> {
        self.send(Method::GET, path, query, None, None).await
    }

    /// Authenticated POST. Rejected before dispatch in read-only mode.
    ///
    /// # Errors
    ///
    /// See [`get`](Self::get); additionally fails with `Authentication` in read-only mode.
    pub async fn post(
        &self,
        path: &str,
        body: Option<&Value>,
        headers: Option<&HeaderMap>,
    ) -> Result<Value> {
        self.ensure_writable()?;
        self.send(Method::POST, path, &[], body, headers).await
    }

    /// Authenticated PUT. Rejected before dispatch in read-only mode.
    ///
    /// # Errors
    ///
    /// See [`post`](Self::post).
    pub async fn put(
        &self,
        path: &str,
        body: Option<&Value>,
        headers: Option<&HeaderMap>,
    ) -> Result<Value> {
        self.ensure_writable()?;
        self.send(Method::PUT, path, &[], body, headers).await
    }

    /// Authenticated DELETE. Rejected before dispatch in read-only mode.
    ///
    /// # Errors
    ///
    /// See [`post`](Self::post).
    pub async fn delete(&self, path: &str) -> Result<Value> {
        self.ensure_writable()?;
        self.send(Method::DELETE, path, &[], None, None).await
    }

    fn url(&self, path: &str) -> Result<Url> {
        let url = if path.starts_with('/') {
            format!("{}{path}", self.base_url())
        } else {
            format!("{}/{path}", self.base_url())
        };
        Url::parse(&url).map_err(|e| GatewayError::unknown(format!("Invalid URL: {e}")))
    }

    async fn send(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, String)],
        body: Option<&Value>,
        headers: Option<&HeaderMap>,
    ) -> Result<Value> {
        let profile = &self.inner.profile;
        if !profile.has_credentials() {
            warn!(service = %self.name(), "call rejected: credentials are not configured");
            return Err(GatewayError::missing_credentials(self.name()));
        }

        let url = self.url(path)?;
        debug!(
            service = %self.name(),
            method = %method,
            url = %redact_url(&url),
            "gateway request"
        );

        let mut request = self
            .inner
            .http
            .request(method.clone(), url)
            .basic_auth(profile.username(), Some(profile.password()));
        if !query.is_empty() {
            request = request.query(query);
        }
        if let Some(headers) = headers {
            request = request.headers(headers.clone());
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request
            .send()
            .await
            .map_err(|e| self.transport_failure(&method, path, &e))?;

        let status = response.status();
        debug!(
            service = %self.name(),
            method = %method,
            path,
            status = status.as_u16(),
            reason = status.canonical_reason().unwrap_or("Unknown"),
            "gateway response"
        );

        // The status line already arrived, so an unreadable error body still classifies by
        // status. A truncated success body is a transport failure.
        let text = match response.text().await {
            Ok(text) => Some(text),
            Err(e) if status.as_u16() >= 400 => {
                debug!(
                    service = %self.name(),
                    status = status.as_u16(),
                    error = %sanitize_reqwest_error(&e),
                    "error response body unreadable"
                );
                None
            }
            Err(e) => {
                return Err(GatewayError::network(format!(
                    "failed to read response body: {}",
                    sanitize_reqwest_error(&e)
                )));
            }
        };

        if status.as_u16() < 400 {
            return Ok(parse_body(text.as_deref().unwrap_or_default()));
        }

        let body = text
            .filter(|t| !t.trim().is_empty())
            .map(|t| parse_body(&t));
        let err = GatewayError::from_status(status.as_u16(), body);
        warn!(
            service = %self.name(),
            method = %method,
            path,
            status = status.as_u16(),
            kind = %err.kind(),
            "gateway call failed"
        );
        Err(err)
    }

    fn transport_failure(&self, method: &Method, path: &str, e: &reqwest::Error) -> GatewayError {
        let msg = sanitize_reqwest_error(e);
        warn!(service = %self.name(), method = %method, path, error = %msg, "no response from upstream");
        if e.is_connect() || e.is_timeout() || e.is_request() {
            GatewayError::network(msg)
        } else {
            GatewayError::unknown(msg)
        }
    }
}

/// Percent-encode one path segment (repository name, component id, ...).
#[must_use]
pub fn encode_path_segment(s: &str) -> String {
    const HEX: &[u8; 16] = b"0123456789ABCDEF";
    let mut out = String::with_capacity(s.len());
    for &b in s.as_bytes() {
        if matches!(b, b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'.' | b'_' | b'~') {
            out.push(b as char);
        } else {
            out.push('%');
            out.push(HEX[(b >> 4) as usize] as char);
            out.push(HEX[(b & 0x0F) as usize] as char);
        }
    }
    out
}

fn parse_body(text: &str) -> Value {
    if text.trim().is_empty() {
        return Value::Null;
    }
    serde_json::from_str(text).unwrap_or_else(|_| Value::String(text.to_string()))
}
