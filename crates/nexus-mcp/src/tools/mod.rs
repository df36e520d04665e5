//! Tool registry: declared tool surface, argument validation, dispatch and result rendering.
//!
//! Each tool is declared once as a [`ToolSpec`] (name, description, HTTP method, JSON input
//! schema). Arguments are deserialized into a typed record per tool and validated before any
//! gateway call is made.

pub mod firewall;
pub mod nexus;
pub mod semantics;

use crate::error::{ToolError, ToolResult};
use nexus_gateway::GatewayClient;
use reqwest::Method;
use rmcp::ErrorData as McpError;
use rmcp::model::{CallToolResult, Content, JsonObject, Tool};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{info, warn};

pub const CHECK_CONNECTIVITY: &str = "nexus_check_connectivity";

/// Which collaborator handles a tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolTarget {
    /// Unauthenticated probes of every configured service.
    Connectivity,
    Nexus,
    Firewall,
}

#[derive(Debug, Clone)]
pub struct ToolSpec {
    pub name: &'static str,
    pub description: &'static str,
    /// HTTP method issued by the tool; drives the MCP annotations.
    pub method: Method,
    pub target: ToolTarget,
    pub input_schema: Value,
}

impl ToolSpec {
    pub(crate) fn new(
        name: &'static str,
        description: &'static str,
        method: Method,
        target: ToolTarget,
        input_schema: Value,
    ) -> Self {
        Self {
            name,
            description,
            method,
            target,
            input_schema,
        }
    }

    fn to_tool(&self) -> Tool {
        let schema = self
            .input_schema
            .as_object()
            .cloned()
            .unwrap_or_else(JsonObject::new);
        let mut tool = Tool::new(self.name, self.description, Arc::new(schema));
        tool.annotations = Some(semantics::annotations_for_method(&self.method));
        tool
    }
}

/// Arguments for tools that take none. Unknown fields are still rejected.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct NoArgs {}

pub(crate) fn no_args_schema() -> Value {
    json!({
        "type": "object",
        "properties": {},
        "additionalProperties": false
    })
}

/// Deserialize `args` into the tool's argument record.
pub(crate) fn parse_args<T: DeserializeOwned>(tool: &str, args: JsonObject) -> ToolResult<T> {
    serde_json::from_value(Value::Object(args)).map_err(|e| ToolError::invalid(tool, e.to_string()))
}

pub(crate) fn require_non_empty(tool: &str, field: &str, value: &str) -> ToolResult<()> {
    if value.trim().is_empty() {
        return Err(ToolError::invalid(tool, format!("'{field}' must not be empty")));
    }
    Ok(())
}

/// The registered tool surface, bound to the gateway clients it calls.
pub struct ToolRegistry {
    nexus: GatewayClient,
    firewall: Option<GatewayClient>,
    tools: Vec<ToolSpec>,
}

impl ToolRegistry {
    /// Register every Nexus tool, plus the Firewall tools when a Firewall client is given, then
    /// restrict to `allowlist` when present. Allow-listed names that do not exist are ignored.
    #[must_use]
    pub fn new(
        nexus: GatewayClient,
        firewall: Option<GatewayClient>,
        allowlist: Option<&BTreeSet<String>>,
    ) -> Self {
        let mut tools = vec![connectivity_spec()];
        tools.extend(nexus::specs());
        if firewall.is_some() {
            tools.extend(firewall::specs());
        }

        if let Some(allow) = allowlist {
            for name in allow {
                if !tools.iter().any(|t| t.name == name.as_str()) {
                    warn!(tool = %name, "allow-listed tool is not available; ignoring");
                }
            }
            tools.retain(|t| allow.contains(t.name));
        }

        info!(count = tools.len(), "registered tools");

        Self {
            nexus,
            firewall,
            tools,
        }
    }

    #[must_use]
    pub fn tool_names(&self) -> Vec<&'static str> {
        self.tools.iter().map(|t| t.name).collect()
    }

    #[must_use]
    pub fn is_read_only(&self) -> bool {
        self.nexus.is_read_only()
    }

    /// List the MCP `Tool`s exposed by this registry.
    #[must_use]
    pub fn list_tools(&self) -> Vec<Tool> {
        self.tools.iter().map(ToolSpec::to_tool).collect()
    }

    /// Execute a tool call.
    ///
    /// Tool failures (bad arguments, classified gateway failures) are returned as `is_error`
    /// results; only a call to an unregistered tool is a protocol error.
    ///
    /// # Errors
    ///
    /// Returns `invalid_params` if `name` is not a registered tool.
    pub async fn call_tool(
        &self,
        name: &str,
        arguments: Option<JsonObject>,
    ) -> Result<CallToolResult, McpError> {
        let Some(spec) = self.tools.iter().find(|t| t.name == name) else {
            return Err(McpError::invalid_params(format!("Unknown tool: {name}"), None));
        };
        let args = arguments.unwrap_or_default();

        info!(tool = name, "tool call");
        let outcome = match spec.target {
            ToolTarget::Connectivity => self.check_connectivity(args).await,
            ToolTarget::Nexus => nexus::dispatch(&self.nexus, name, args).await,
            ToolTarget::Firewall => {
                let Some(firewall) = &self.firewall else {
                    return Err(McpError::invalid_params(
                        format!("Firewall is not configured for tool: {name}"),
                        None,
                    ));
                };
                firewall::dispatch(firewall, name, args).await
            }
        };

        if let Err(e) = &outcome {
            warn!(tool = name, kind = %e.kind(), status = e.status(), error = %e, "tool call failed");
        }
        Ok(render(outcome))
    }

    async fn check_connectivity(&self, args: JsonObject) -> ToolResult<Value> {
        let NoArgs {} = parse_args(CHECK_CONNECTIVITY, args)?;

        let firewall_probe = async {
            match &self.firewall {
                Some(c) => Some(c.probe().await),
                None => None,
            }
        };
        let (nexus_ok, firewall_ok) = tokio::join!(self.nexus.probe(), firewall_probe);

        let firewall = match (&self.firewall, firewall_ok) {
            (Some(c), Some(ok)) => service_status(c, ok),
            _ => Value::Null,
        };
        Ok(json!({
            "nexus": service_status(&self.nexus, nexus_ok),
            "firewall": firewall,
        }))
    }
}

fn service_status(client: &GatewayClient, reachable: bool) -> Value {
    json!({
        "baseUrl": client.base_url(),
        "reachable": reachable,
        "readOnly": client.is_read_only(),
    })
}

fn connectivity_spec() -> ToolSpec {
    ToolSpec::new(
        CHECK_CONNECTIVITY,
        "Check whether Nexus (and Firewall, when configured) are reachable. Uses the unauthenticated health endpoints, so it also works before credentials are set up.",
        Method::GET,
        ToolTarget::Connectivity,
        no_args_schema(),
    )
}

/// Render a tool outcome as an MCP result.
///
/// Failures carry `structuredContent.error.kind` so callers can dispatch on the typed kind
/// instead of the message text.
fn render(outcome: ToolResult<Value>) -> CallToolResult {
    match outcome {
        Ok(Value::String(s)) => CallToolResult::success(vec![Content::text(s)]),
        Ok(body) => {
            let text = serde_json::to_string_pretty(&body).unwrap_or_else(|_| body.to_string());
            CallToolResult::success(vec![Content::text(text)])
        }
        Err(e) => {
            let message = e.to_string();
            let structured = json!({
                "error": {
                    "kind": e.kind(),
                    "status": e.status(),
                    "message": message,
                }
            });
            CallToolResult {
                content: vec![Content::text(message)],
                structured_content: Some(structured),
                is_error: Some(true),
                meta: None,
            }
        }
    }
}
