//! Sonatype Firewall / IQ Server tools (REST API under `/api/v2`).

use super::{NoArgs, ToolSpec, ToolTarget, no_args_schema, parse_args, require_non_empty};
use crate::error::{ToolError, ToolResult};
use nexus_gateway::GatewayClient;
use nexus_gateway::client::encode_path_segment;
use reqwest::Method;
use rmcp::model::JsonObject;
use serde::Deserialize;
use serde_json::{Value, json};

pub const LIST_APPLICATIONS: &str = "firewall_list_applications";
pub const GET_QUARANTINE_SUMMARY: &str = "firewall_get_quarantine_summary";
pub const LIST_QUARANTINED_COMPONENTS: &str = "firewall_list_quarantined_components";
pub const EVALUATE_COMPONENT: &str = "firewall_evaluate_component";

const MAX_PAGE_SIZE: u32 = 100;

fn default_page() -> u32 {
    1
}

fn default_page_size() -> u32 {
    10
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ListApplicationsArgs {
    #[serde(default)]
    public_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct QuarantinedComponentsArgs {
    #[serde(default = "default_page")]
    page: u32,
    #[serde(default = "default_page_size")]
    page_size: u32,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct EvaluateComponentArgs {
    application_id: String,
    package_url: String,
}

pub(crate) fn specs() -> Vec<ToolSpec> {
    vec![
        ToolSpec::new(
            LIST_APPLICATIONS,
            "List IQ Server applications, optionally by public id.",
            Method::GET,
            ToolTarget::Firewall,
            json!({
                "type": "object",
                "properties": {"public_id": {"type": "string"}},
                "additionalProperties": false
            }),
        ),
        ToolSpec::new(
            GET_QUARANTINE_SUMMARY,
            "Summarize Firewall quarantine activity across repositories.",
            Method::GET,
            ToolTarget::Firewall,
            no_args_schema(),
        ),
        ToolSpec::new(
            LIST_QUARANTINED_COMPONENTS,
            "List components currently quarantined by Firewall.",
            Method::GET,
            ToolTarget::Firewall,
            json!({
                "type": "object",
                "properties": {
                    "page": {"type": "integer", "minimum": 1, "default": 1},
                    "page_size": {"type": "integer", "minimum": 1, "maximum": MAX_PAGE_SIZE, "default": 10}
                },
                "additionalProperties": false
            }),
        ),
        ToolSpec::new(
            EVALUATE_COMPONENT,
            "Evaluate a component, given as a package URL, against an application's policies.",
            Method::POST,
            ToolTarget::Firewall,
            json!({
                "type": "object",
                "properties": {
                    "application_id": {"type": "string", "description": "Internal application id"},
                    "package_url": {"type": "string", "description": "Package URL, e.g. pkg:maven/org.slf4j/slf4j-api@2.0.9"}
                },
                "required": ["application_id", "package_url"],
                "additionalProperties": false
            }),
        ),
    ]
}

pub(crate) async fn dispatch(
    client: &GatewayClient,
    name: &str,
    args: JsonObject,
) -> ToolResult<Value> {
    match name {
        LIST_APPLICATIONS => {
            let ListApplicationsArgs { public_id } = parse_args(name, args)?;
            let query: Vec<(&str, String)> = public_id
                .map(|id| id.trim().to_string())
                .filter(|id| !id.is_empty())
                .map(|id| ("publicId", id))
                .into_iter()
                .collect();
            Ok(client.get("/api/v2/applications", &query).await?)
        }
        GET_QUARANTINE_SUMMARY => {
            let NoArgs {} = parse_args(name, args)?;
            Ok(client
                .get("/api/v2/firewall/quarantine/summary", &[])
                .await?)
        }
        LIST_QUARANTINED_COMPONENTS => {
            let QuarantinedComponentsArgs { page, page_size } = parse_args(name, args)?;
            if page < 1 {
                return Err(ToolError::invalid(name, "'page' must be at least 1"));
            }
            if !(1..=MAX_PAGE_SIZE).contains(&page_size) {
                return Err(ToolError::invalid(
                    name,
                    format!("'page_size' must be between 1 and {MAX_PAGE_SIZE}"),
                ));
            }
            let query = [("page", page.to_string()), ("pageSize", page_size.to_string())];
            Ok(client
                .get("/api/v2/firewall/components/quarantined", &query)
                .await?)
        }
        EVALUATE_COMPONENT => {
            let EvaluateComponentArgs {
                application_id,
                package_url,
            } = parse_args(name, args)?;
            require_non_empty(name, "application_id", &application_id)?;
            let package_url = package_url.trim();
            if !package_url.starts_with("pkg:") {
                return Err(ToolError::invalid(
                    name,
                    "'package_url' must be a package URL starting with 'pkg:'",
                ));
            }
            let path = format!(
                "/api/v2/evaluation/applications/{}",
                encode_path_segment(application_id.trim())
            );
            let body = json!({"components": [{"packageUrl": package_url}]});
            Ok(client.post(&path, Some(&body), None).await?)
        }
        other => Err(ToolError::invalid(other, "not a Firewall tool")),
    }
}
