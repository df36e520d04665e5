use crate::config::Settings;
use crate::tools::ToolRegistry;
use anyhow::Context as _;
use nexus_gateway::{ConnectionProfile, GatewayClient};
use rmcp::{
    ErrorData as McpError, RoleServer, ServerHandler, ServiceExt, model::*,
    service::RequestContext, transport::stdio,
};
use std::sync::Arc;

/// MCP server exposing Nexus Repository Manager (and optionally Firewall) as tools.
///
/// The tool surface depends on runtime configuration (Firewall, allow-list), so `ServerHandler`
/// is implemented by hand and delegates to the [`ToolRegistry`].
#[derive(Clone)]
pub struct NexusMcpServer {
    registry: Arc<ToolRegistry>,
}

impl NexusMcpServer {
    #[must_use]
    pub fn new(registry: ToolRegistry) -> Self {
        Self {
            registry: Arc::new(registry),
        }
    }

    fn instructions(&self) -> String {
        let mut text = String::from(
            "Manage Sonatype Nexus Repository Manager: repositories, components, blob stores, \
             tasks, users and roles. Start with nexus_check_connectivity if calls fail. Failed \
             calls carry structuredContent.error.kind (network, authentication, not_found, \
             validation, server, unknown, configuration).",
        );
        if self.registry.is_read_only() {
            text.push_str(
                " The server runs in read-only mode: create, update, delete and run calls are rejected.",
            );
        }
        text
    }
}

impl ServerHandler for NexusMcpServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::V_2024_11_05,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: "nexus-mcp".into(),
                version: env!("CARGO_PKG_VERSION").into(),
                title: None,
                description: None,
                icons: None,
                website_url: None,
            },
            instructions: Some(self.instructions()),
        }
    }

    async fn list_tools(
        &self,
        _request: Option<PaginatedRequestParams>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListToolsResult, McpError> {
        Ok(ListToolsResult {
            tools: self.registry.list_tools(),
            next_cursor: None,
            meta: None,
        })
    }

    async fn call_tool(
        &self,
        request: CallToolRequestParams,
        _context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, McpError> {
        self.registry
            .call_tool(request.name.as_ref(), request.arguments)
            .await
    }
}

fn client_for(profile: ConnectionProfile) -> anyhow::Result<GatewayClient> {
    if !profile.has_credentials() {
        tracing::warn!(
            service = %profile.name(),
            "no credentials configured; authenticated calls will fail until they are set"
        );
    }
    let name = profile.name().to_string();
    GatewayClient::new(profile).with_context(|| format!("build {name} client"))
}

/// Build the gateway clients from `settings` and serve MCP over stdio until the peer disconnects.
///
/// # Errors
///
/// Returns an error if a client cannot be built or the stdio transport fails.
pub async fn run(settings: Settings) -> anyhow::Result<()> {
    let Settings {
        nexus,
        firewall,
        tool_allowlist,
    } = settings;

    tracing::info!(
        nexus_url = %nexus.base_url(),
        firewall_url = firewall.as_ref().map_or("-", |f| f.base_url()),
        read_only = nexus.read_only(),
        timeout_secs = nexus.timeout().as_secs(),
        "nexus-mcp starting"
    );

    let nexus = client_for(nexus)?;
    let firewall = firewall.map(client_for).transpose()?;
    let registry = ToolRegistry::new(nexus, firewall, tool_allowlist.as_ref());

    let service = NexusMcpServer::new(registry)
        .serve(stdio())
        .await
        .inspect_err(|e| tracing::error!("serving error: {e:?}"))?;

    tracing::info!("nexus-mcp ready on stdio");
    service.waiting().await?;
    tracing::info!("nexus-mcp stopped");
    Ok(())
}
