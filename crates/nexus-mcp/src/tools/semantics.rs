//! MCP tool annotations derived from the HTTP method a tool issues.
//!
//! Every tool talks to an external repository manager, so `openWorldHint` is always `true`.

use reqwest::Method;
use rmcp::model::ToolAnnotations;

#[must_use]
pub fn annotations_for_method(method: &Method) -> ToolAnnotations {
    let open_world_hint = Some(true);

    let (read_only, destructive, idempotent) = if method == Method::GET || method == Method::HEAD
    {
        (Some(true), Some(false), Some(true))
    } else if method == Method::POST {
        (Some(false), Some(false), Some(false))
    } else if method == Method::PUT || method == Method::DELETE {
        (Some(false), Some(true), Some(true))
    } else {
        (None, None, None)
    };

    ToolAnnotations {
        title: None,
        read_only_hint: read_only,
        destructive_hint: destructive,
        idempotent_hint: idempotent,
        open_world_hint,
    }
}
