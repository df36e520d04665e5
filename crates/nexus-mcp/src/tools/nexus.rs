//! Nexus Repository Manager tools (REST API under `/service/rest/v1`).

use super::{NoArgs, ToolSpec, ToolTarget, no_args_schema, parse_args, require_non_empty};
use crate::error::{ToolError, ToolResult};
use nexus_gateway::GatewayClient;
use nexus_gateway::client::encode_path_segment;
use reqwest::Method;
use rmcp::model::JsonObject;
use serde::Deserialize;
use serde_json::{Map, Value, json};

const API: &str = "/service/rest/v1";

pub const GET_SYSTEM_STATUS: &str = "nexus_get_system_status";
pub const LIST_REPOSITORIES: &str = "nexus_list_repositories";
pub const GET_REPOSITORY: &str = "nexus_get_repository";
pub const CREATE_REPOSITORY: &str = "nexus_create_repository";
pub const UPDATE_REPOSITORY: &str = "nexus_update_repository";
pub const DELETE_REPOSITORY: &str = "nexus_delete_repository";
pub const SEARCH_COMPONENTS: &str = "nexus_search_components";
pub const LIST_COMPONENTS: &str = "nexus_list_components";
pub const GET_COMPONENT: &str = "nexus_get_component";
pub const DELETE_COMPONENT: &str = "nexus_delete_component";
pub const LIST_BLOB_STORES: &str = "nexus_list_blob_stores";
pub const LIST_TASKS: &str = "nexus_list_tasks";
pub const RUN_TASK: &str = "nexus_run_task";
pub const LIST_USERS: &str = "nexus_list_users";
pub const LIST_ROLES: &str = "nexus_list_roles";

const FORMATS: &[&str] = &[
    "maven", "npm", "pypi", "nuget", "docker", "raw", "rubygems", "helm", "yum", "go",
];
const TYPES: &[&str] = &["hosted", "proxy", "group"];
const WRITE_POLICIES: &[&str] = &["allow", "allow_once", "deny"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub(crate) enum RepositoryFormat {
    #[serde(alias = "maven2")]
    Maven,
    Npm,
    Pypi,
    Nuget,
    Docker,
    Raw,
    Rubygems,
    Helm,
    Yum,
    Go,
}

impl RepositoryFormat {
    /// Segment used in `/repositories/{format}/{type}` paths.
    fn path_segment(self) -> &'static str {
        match self {
            Self::Maven => "maven",
            Self::Npm => "npm",
            Self::Pypi => "pypi",
            Self::Nuget => "nuget",
            Self::Docker => "docker",
            Self::Raw => "raw",
            Self::Rubygems => "rubygems",
            Self::Helm => "helm",
            Self::Yum => "yum",
            Self::Go => "go",
        }
    }

    /// Name Nexus reports in listings and accepts in search.
    fn listed_name(self) -> &'static str {
        match self {
            Self::Maven => "maven2",
            other => other.path_segment(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub(crate) enum RepositoryType {
    Hosted,
    Proxy,
    Group,
}

impl RepositoryType {
    fn as_str(self) -> &'static str {
        match self {
            Self::Hosted => "hosted",
            Self::Proxy => "proxy",
            Self::Group => "group",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub(crate) enum WritePolicy {
    #[serde(alias = "ALLOW")]
    Allow,
    #[default]
    #[serde(alias = "ALLOW_ONCE")]
    AllowOnce,
    #[serde(alias = "DENY")]
    Deny,
}

impl WritePolicy {
    fn as_str(self) -> &'static str {
        match self {
            Self::Allow => "allow",
            Self::AllowOnce => "allow_once",
            Self::Deny => "deny",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub(crate) enum VersionPolicy {
    #[default]
    #[serde(alias = "RELEASE")]
    Release,
    #[serde(alias = "SNAPSHOT")]
    Snapshot,
    #[serde(alias = "MIXED")]
    Mixed,
}

impl VersionPolicy {
    fn as_str(self) -> &'static str {
        match self {
            Self::Release => "RELEASE",
            Self::Snapshot => "SNAPSHOT",
            Self::Mixed => "MIXED",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub(crate) enum LayoutPolicy {
    #[default]
    #[serde(alias = "STRICT")]
    Strict,
    #[serde(alias = "PERMISSIVE")]
    Permissive,
}

impl LayoutPolicy {
    fn as_str(self) -> &'static str {
        match self {
            Self::Strict => "STRICT",
            Self::Permissive => "PERMISSIVE",
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_blob_store() -> String {
    "default".to_string()
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ListRepositoriesArgs {
    #[serde(default)]
    format: Option<RepositoryFormat>,
    #[serde(default, rename = "type")]
    repo_type: Option<RepositoryType>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct NameArgs {
    name: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct CreateRepositoryArgs {
    name: String,
    format: RepositoryFormat,
    #[serde(rename = "type")]
    repo_type: RepositoryType,
    #[serde(default = "default_true")]
    online: bool,
    #[serde(default = "default_blob_store")]
    blob_store: String,
    #[serde(default = "default_true")]
    strict_content_type_validation: bool,
    #[serde(default)]
    write_policy: WritePolicy,
    #[serde(default)]
    remote_url: Option<String>,
    #[serde(default)]
    member_names: Vec<String>,
    #[serde(default)]
    version_policy: VersionPolicy,
    #[serde(default)]
    layout_policy: LayoutPolicy,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct UpdateRepositoryArgs {
    name: String,
    format: Option<RepositoryFormat>,
    #[serde(rename = "type")]
    repo_type: Option<RepositoryType>,
    #[serde(default)]
    online: Option<bool>,
    #[serde(default)]
    strict_content_type_validation: Option<bool>,
    #[serde(default)]
    write_policy: Option<WritePolicy>,
    #[serde(default)]
    remote_url: Option<String>,
    #[serde(default)]
    member_names: Option<Vec<String>>,
}

impl UpdateRepositoryArgs {
    fn has_changes(&self) -> bool {
        self.online.is_some()
            || self.strict_content_type_validation.is_some()
            || self.write_policy.is_some()
            || self.remote_url.is_some()
            || self.member_names.is_some()
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct SearchComponentsArgs {
    #[serde(default)]
    repository: Option<String>,
    #[serde(default)]
    format: Option<RepositoryFormat>,
    #[serde(default)]
    group: Option<String>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    version: Option<String>,
    #[serde(default)]
    keyword: Option<String>,
    #[serde(default)]
    continuation_token: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ListComponentsArgs {
    repository: String,
    #[serde(default)]
    continuation_token: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct IdArgs {
    id: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ListTasksArgs {
    #[serde(default, rename = "type")]
    task_type: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ListUsersArgs {
    #[serde(default)]
    user_id: Option<String>,
    #[serde(default)]
    source: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct SourceArgs {
    #[serde(default)]
    source: Option<String>,
}

pub(crate) fn specs() -> Vec<ToolSpec> {
    let format = json!({"type": "string", "enum": FORMATS});
    let repo_type = json!({"type": "string", "enum": TYPES});
    let write_policy = json!({"type": "string", "enum": WRITE_POLICIES});
    let continuation = json!({
        "type": "string",
        "description": "Token from a previous page's continuationToken"
    });

    vec![
        ToolSpec::new(
            GET_SYSTEM_STATUS,
            "Run the Nexus system status checks (blob stores, file descriptors, license, ...).",
            Method::GET,
            ToolTarget::Nexus,
            no_args_schema(),
        ),
        ToolSpec::new(
            LIST_REPOSITORIES,
            "List repositories, optionally filtered by format and type.",
            Method::GET,
            ToolTarget::Nexus,
            json!({
                "type": "object",
                "properties": {"format": format, "type": repo_type},
                "additionalProperties": false
            }),
        ),
        ToolSpec::new(
            GET_REPOSITORY,
            "Get a repository by name.",
            Method::GET,
            ToolTarget::Nexus,
            json!({
                "type": "object",
                "properties": {"name": {"type": "string"}},
                "required": ["name"],
                "additionalProperties": false
            }),
        ),
        ToolSpec::new(
            CREATE_REPOSITORY,
            "Create a hosted, proxy or group repository. Proxy repositories need remote_url; group repositories need member_names.",
            Method::POST,
            ToolTarget::Nexus,
            json!({
                "type": "object",
                "properties": {
                    "name": {"type": "string"},
                    "format": format,
                    "type": repo_type,
                    "online": {"type": "boolean", "default": true},
                    "blob_store": {"type": "string", "default": "default"},
                    "strict_content_type_validation": {"type": "boolean", "default": true},
                    "write_policy": {"type": "string", "enum": WRITE_POLICIES, "default": "allow_once"},
                    "remote_url": {"type": "string", "description": "Upstream URL (proxy only)"},
                    "member_names": {"type": "array", "items": {"type": "string"}, "description": "Member repositories (group only)"},
                    "version_policy": {"type": "string", "enum": ["release", "snapshot", "mixed"], "default": "release"},
                    "layout_policy": {"type": "string", "enum": ["strict", "permissive"], "default": "strict"}
                },
                "required": ["name", "format", "type"],
                "additionalProperties": false
            }),
        ),
        ToolSpec::new(
            UPDATE_REPOSITORY,
            "Update selected settings of an existing repository. The current configuration is fetched and only the given fields change.",
            Method::PUT,
            ToolTarget::Nexus,
            json!({
                "type": "object",
                "properties": {
                    "name": {"type": "string"},
                    "format": format,
                    "type": repo_type,
                    "online": {"type": "boolean"},
                    "strict_content_type_validation": {"type": "boolean"},
                    "write_policy": write_policy,
                    "remote_url": {"type": "string"},
                    "member_names": {"type": "array", "items": {"type": "string"}}
                },
                "required": ["name", "format", "type"],
                "additionalProperties": false
            }),
        ),
        ToolSpec::new(
            DELETE_REPOSITORY,
            "Delete a repository and all of its content.",
            Method::DELETE,
            ToolTarget::Nexus,
            json!({
                "type": "object",
                "properties": {"name": {"type": "string"}},
                "required": ["name"],
                "additionalProperties": false
            }),
        ),
        ToolSpec::new(
            SEARCH_COMPONENTS,
            "Search components across repositories. At least one criterion is required.",
            Method::GET,
            ToolTarget::Nexus,
            json!({
                "type": "object",
                "properties": {
                    "repository": {"type": "string"},
                    "format": format,
                    "group": {"type": "string"},
                    "name": {"type": "string"},
                    "version": {"type": "string"},
                    "keyword": {"type": "string", "description": "Free-text keyword"},
                    "continuation_token": continuation
                },
                "additionalProperties": false
            }),
        ),
        ToolSpec::new(
            LIST_COMPONENTS,
            "List the components of a repository, one page at a time.",
            Method::GET,
            ToolTarget::Nexus,
            json!({
                "type": "object",
                "properties": {
                    "repository": {"type": "string"},
                    "continuation_token": continuation
                },
                "required": ["repository"],
                "additionalProperties": false
            }),
        ),
        ToolSpec::new(
            GET_COMPONENT,
            "Get a component by id.",
            Method::GET,
            ToolTarget::Nexus,
            id_schema(),
        ),
        ToolSpec::new(
            DELETE_COMPONENT,
            "Delete a component and its assets by id.",
            Method::DELETE,
            ToolTarget::Nexus,
            id_schema(),
        ),
        ToolSpec::new(
            LIST_BLOB_STORES,
            "List blob stores with their usage.",
            Method::GET,
            ToolTarget::Nexus,
            no_args_schema(),
        ),
        ToolSpec::new(
            LIST_TASKS,
            "List scheduled tasks, optionally filtered by task type.",
            Method::GET,
            ToolTarget::Nexus,
            json!({
                "type": "object",
                "properties": {"type": {"type": "string"}},
                "additionalProperties": false
            }),
        ),
        ToolSpec::new(
            RUN_TASK,
            "Run a scheduled task now.",
            Method::POST,
            ToolTarget::Nexus,
            id_schema(),
        ),
        ToolSpec::new(
            LIST_USERS,
            "List users, optionally filtered by user id prefix and source.",
            Method::GET,
            ToolTarget::Nexus,
            json!({
                "type": "object",
                "properties": {
                    "user_id": {"type": "string"},
                    "source": {"type": "string"}
                },
                "additionalProperties": false
            }),
        ),
        ToolSpec::new(
            LIST_ROLES,
            "List roles, optionally restricted to one source.",
            Method::GET,
            ToolTarget::Nexus,
            json!({
                "type": "object",
                "properties": {"source": {"type": "string"}},
                "additionalProperties": false
            }),
        ),
    ]
}

fn id_schema() -> Value {
    json!({
        "type": "object",
        "properties": {"id": {"type": "string"}},
        "required": ["id"],
        "additionalProperties": false
    })
}

pub(crate) async fn dispatch(
    client: &GatewayClient,
    name: &str,
    args: JsonObject,
) -> ToolResult<Value> {
    match name {
        GET_SYSTEM_STATUS => {
            let NoArgs {} = parse_args(name, args)?;
            Ok(client.get(&format!("{API}/status/check"), &[]).await?)
        }
        LIST_REPOSITORIES => list_repositories(client, parse_args(name, args)?).await,
        GET_REPOSITORY => {
            let NameArgs { name: repo } = parse_args(name, args)?;
            require_non_empty(name, "name", &repo)?;
            let path = format!("{API}/repositories/{}", encode_path_segment(&repo));
            Ok(client.get(&path, &[]).await?)
        }
        CREATE_REPOSITORY => create_repository(client, parse_args(name, args)?).await,
        UPDATE_REPOSITORY => update_repository(client, parse_args(name, args)?).await,
        DELETE_REPOSITORY => {
            let NameArgs { name: repo } = parse_args(name, args)?;
            require_non_empty(name, "name", &repo)?;
            let path = format!("{API}/repositories/{}", encode_path_segment(&repo));
            let body = client.delete(&path).await?;
            Ok(confirm_or(body, json!({"status": "deleted", "repository": repo})))
        }
        SEARCH_COMPONENTS => search_components(client, parse_args(name, args)?).await,
        LIST_COMPONENTS => {
            let ListComponentsArgs {
                repository,
                continuation_token,
            } = parse_args(name, args)?;
            require_non_empty(name, "repository", &repository)?;
            let mut query = vec![("repository", repository)];
            push_opt(&mut query, "continuationToken", continuation_token);
            let page = client.get(&format!("{API}/components"), &query).await?;
            shape_component_page(&page)
        }
        GET_COMPONENT => {
            let IdArgs { id } = parse_args(name, args)?;
            require_non_empty(name, "id", &id)?;
            let path = format!("{API}/components/{}", encode_path_segment(&id));
            Ok(client.get(&path, &[]).await?)
        }
        DELETE_COMPONENT => {
            let IdArgs { id } = parse_args(name, args)?;
            require_non_empty(name, "id", &id)?;
            let path = format!("{API}/components/{}", encode_path_segment(&id));
            let body = client.delete(&path).await?;
            Ok(confirm_or(body, json!({"status": "deleted", "component": id})))
        }
        LIST_BLOB_STORES => {
            let NoArgs {} = parse_args(name, args)?;
            Ok(client.get(&format!("{API}/blobstores"), &[]).await?)
        }
        LIST_TASKS => {
            let ListTasksArgs { task_type } = parse_args(name, args)?;
            let mut query = Vec::new();
            push_opt(&mut query, "type", task_type);
            Ok(client.get(&format!("{API}/tasks"), &query).await?)
        }
        RUN_TASK => {
            let IdArgs { id } = parse_args(name, args)?;
            require_non_empty(name, "id", &id)?;
            let path = format!("{API}/tasks/{}/run", encode_path_segment(&id));
            let body = client.post(&path, None, None).await?;
            Ok(confirm_or(body, json!({"status": "started", "task": id})))
        }
        LIST_USERS => {
            let ListUsersArgs { user_id, source } = parse_args(name, args)?;
            let mut query = Vec::new();
            push_opt(&mut query, "userId", user_id);
            push_opt(&mut query, "source", source);
            Ok(client.get(&format!("{API}/security/users"), &query).await?)
        }
        LIST_ROLES => {
            let SourceArgs { source } = parse_args(name, args)?;
            let mut query = Vec::new();
            push_opt(&mut query, "source", source);
            Ok(client.get(&format!("{API}/security/roles"), &query).await?)
        }
        other => Err(ToolError::invalid(other, "not a Nexus tool")),
    }
}

/// Append `key=value` when `value` is present and not blank.
fn push_opt(query: &mut Vec<(&'static str, String)>, key: &'static str, value: Option<String>) {
    if let Some(v) = value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty()) {
        query.push((key, v));
    }
}

/// Mutations usually answer `204 No Content`; report something readable instead of `null`.
fn confirm_or(body: Value, confirmation: Value) -> Value {
    match body {
        Value::Null => confirmation,
        Value::String(s) if s.trim().is_empty() => confirmation,
        other => other,
    }
}

async fn list_repositories(client: &GatewayClient, args: ListRepositoriesArgs) -> ToolResult<Value> {
    let body = client.get(&format!("{API}/repositories"), &[]).await?;
    let Value::Array(repos) = body else {
        return Err(unexpected("repository listing is not an array"));
    };

    let shaped: Vec<Value> = repos
        .iter()
        .filter(|r| {
            args.format
                .is_none_or(|f| str_field(r, "format") == Some(f.listed_name()))
        })
        .filter(|r| {
            args.repo_type
                .is_none_or(|t| str_field(r, "type") == Some(t.as_str()))
        })
        .map(shape_repository)
        .collect();
    Ok(Value::Array(shaped))
}

fn shape_repository(repo: &Value) -> Value {
    let mut out = Map::new();
    for key in ["name", "format", "type", "url"] {
        out.insert(
            key.to_string(),
            repo.get(key).cloned().unwrap_or(Value::Null),
        );
    }
    if let Some(online) = repo.get("online") {
        out.insert("online".to_string(), online.clone());
    }
    Value::Object(out)
}

async fn create_repository(client: &GatewayClient, args: CreateRepositoryArgs) -> ToolResult<Value> {
    let body = repository_body(&args)?;
    let path = format!(
        "{API}/repositories/{}/{}",
        args.format.path_segment(),
        args.repo_type.as_str()
    );
    let response = client.post(&path, Some(&body), None).await?;
    Ok(confirm_or(
        response,
        json!({
            "status": "created",
            "repository": args.name,
            "format": args.format.path_segment(),
            "type": args.repo_type.as_str(),
        }),
    ))
}

/// Build the create-repository payload for the requested format and type.
pub(crate) fn repository_body(args: &CreateRepositoryArgs) -> ToolResult<Value> {
    let tool = CREATE_REPOSITORY;
    require_non_empty(tool, "name", &args.name)?;
    require_non_empty(tool, "blob_store", &args.blob_store)?;

    let mut storage = json!({
        "blobStoreName": args.blob_store,
        "strictContentTypeValidation": args.strict_content_type_validation,
    });

    let mut body = json!({
        "name": args.name,
        "online": args.online,
    });

    match args.repo_type {
        RepositoryType::Hosted => {
            if args.format == RepositoryFormat::Go {
                return Err(ToolError::invalid(tool, "go repositories cannot be hosted"));
            }
            storage["writePolicy"] = json!(args.write_policy.as_str());
        }
        RepositoryType::Proxy => {
            let remote_url = args
                .remote_url
                .as_deref()
                .map(str::trim)
                .filter(|u| !u.is_empty())
                .ok_or_else(|| ToolError::invalid(tool, "'remote_url' is required for proxy repositories"))?;
            body["proxy"] = json!({
                "remoteUrl": remote_url,
                "contentMaxAge": 1440,
                "metadataMaxAge": 1440,
            });
            body["negativeCache"] = json!({"enabled": true, "timeToLive": 1440});
            body["httpClient"] = json!({"blocked": false, "autoBlock": true});
        }
        RepositoryType::Group => {
            let members = member_list(tool, &args.member_names)?;
            body["group"] = json!({"memberNames": members});
        }
    }
    body["storage"] = storage;

    match args.format {
        RepositoryFormat::Maven => {
            body["maven"] = json!({
                "versionPolicy": args.version_policy.as_str(),
                "layoutPolicy": args.layout_policy.as_str(),
            });
        }
        RepositoryFormat::Docker => {
            body["docker"] = json!({"v1Enabled": false, "forceBasicAuth": true});
            if args.repo_type == RepositoryType::Proxy {
                body["dockerProxy"] = json!({"indexType": "REGISTRY"});
            }
        }
        RepositoryFormat::Nuget if args.repo_type == RepositoryType::Proxy => {
            body["nugetProxy"] = json!({"queryCacheItemMaxAge": 3600, "nugetVersion": "V3"});
        }
        RepositoryFormat::Yum if args.repo_type == RepositoryType::Hosted => {
            body["yum"] = json!({"repodataDepth": 0, "deployPolicy": "STRICT"});
        }
        _ => {}
    }

    Ok(body)
}

async fn update_repository(client: &GatewayClient, args: UpdateRepositoryArgs) -> ToolResult<Value> {
    let tool = UPDATE_REPOSITORY;
    require_non_empty(tool, "name", &args.name)?;
    let (Some(format), Some(repo_type)) = (args.format, args.repo_type) else {
        return Err(ToolError::invalid(tool, "'format' and 'type' are required"));
    };
    if !args.has_changes() {
        return Err(ToolError::invalid(tool, "no settings to change were given"));
    }

    // Nothing is fetched in read-only mode.
    client.ensure_writable()?;

    let path = format!(
        "{API}/repositories/{}/{}/{}",
        format.path_segment(),
        repo_type.as_str(),
        encode_path_segment(&args.name)
    );
    let current = client.get(&path, &[]).await?;
    let updated = apply_update(current, repo_type, &args)?;
    let response = client.put(&path, Some(&updated), None).await?;
    Ok(confirm_or(
        response,
        json!({"status": "updated", "repository": args.name}),
    ))
}

/// Merge the requested changes into the repository's current settings.
///
/// Fields Nexus reports but rejects on update (`format`, `type`, `url`) are removed.
pub(crate) fn apply_update(
    current: Value,
    repo_type: RepositoryType,
    args: &UpdateRepositoryArgs,
) -> ToolResult<Value> {
    let tool = UPDATE_REPOSITORY;
    let Value::Object(mut settings) = current else {
        return Err(unexpected("repository settings are not an object"));
    };
    for key in ["format", "type", "url"] {
        settings.remove(key);
    }

    if let Some(online) = args.online {
        settings.insert("online".to_string(), json!(online));
    }
    if let Some(strict) = args.strict_content_type_validation {
        set_nested(&mut settings, "storage", "strictContentTypeValidation", json!(strict));
    }
    if let Some(policy) = args.write_policy {
        if repo_type != RepositoryType::Hosted {
            return Err(ToolError::invalid(tool, "'write_policy' only applies to hosted repositories"));
        }
        set_nested(&mut settings, "storage", "writePolicy", json!(policy.as_str()));
    }
    if let Some(remote_url) = &args.remote_url {
        if repo_type != RepositoryType::Proxy {
            return Err(ToolError::invalid(tool, "'remote_url' only applies to proxy repositories"));
        }
        require_non_empty(tool, "remote_url", remote_url)?;
        set_nested(&mut settings, "proxy", "remoteUrl", json!(remote_url.trim()));
    }
    if let Some(members) = &args.member_names {
        if repo_type != RepositoryType::Group {
            return Err(ToolError::invalid(tool, "'member_names' only applies to group repositories"));
        }
        let members = member_list(tool, members)?;
        set_nested(&mut settings, "group", "memberNames", json!(members));
    }

    Ok(Value::Object(settings))
}

/// Trimmed, non-blank group member names; at least one is required.
fn member_list<'a>(tool: &str, names: &'a [String]) -> ToolResult<Vec<&'a str>> {
    let members: Vec<&str> = names
        .iter()
        .map(|m| m.trim())
        .filter(|m| !m.is_empty())
        .collect();
    if members.is_empty() {
        return Err(ToolError::invalid(
            tool,
            "'member_names' must list at least one repository for group repositories",
        ));
    }
    Ok(members)
}

/// Set `section.field`, creating `section` when it is missing or not an object.
fn set_nested(settings: &mut Map<String, Value>, section: &str, field: &str, value: Value) {
    let mut inner = match settings.remove(section) {
        Some(Value::Object(map)) => map,
        _ => Map::new(),
    };
    inner.insert(field.to_string(), value);
    settings.insert(section.to_string(), Value::Object(inner));
}

async fn search_components(client: &GatewayClient, args: SearchComponentsArgs) -> ToolResult<Value> {
    let SearchComponentsArgs {
        repository,
        format,
        group,
        name,
        version,
        keyword,
        continuation_token,
    } = args;

    let mut query = Vec::new();
    push_opt(&mut query, "repository", repository);
    push_opt(&mut query, "format", format.map(|f| f.listed_name().to_string()));
    push_opt(&mut query, "group", group);
    push_opt(&mut query, "name", name);
    push_opt(&mut query, "version", version);
    push_opt(&mut query, "q", keyword);
    if query.is_empty() {
        return Err(ToolError::invalid(
            SEARCH_COMPONENTS,
            "at least one of repository, format, group, name, version or keyword is required",
        ));
    }
    push_opt(&mut query, "continuationToken", continuation_token);

    let page = client.get(&format!("{API}/search"), &query).await?;
    shape_component_page(&page)
}

/// Reduce a `{items, continuationToken}` page to the fields worth showing.
fn shape_component_page(page: &Value) -> ToolResult<Value> {
    let Some(items) = page.get("items").and_then(Value::as_array) else {
        return Err(unexpected("component page has no 'items' array"));
    };
    let components: Vec<Value> = items.iter().map(shape_component).collect();
    Ok(json!({
        "items": components,
        "continuationToken": page.get("continuationToken").cloned().unwrap_or(Value::Null),
    }))
}

fn shape_component(component: &Value) -> Value {
    let assets: Vec<Value> = component
        .get("assets")
        .and_then(Value::as_array)
        .map(|assets| {
            assets
                .iter()
                .filter_map(|a| a.get("path").cloned())
                .collect()
        })
        .unwrap_or_default();

    let mut out = Map::new();
    for key in ["id", "repository", "format", "group", "name", "version"] {
        out.insert(
            key.to_string(),
            component.get(key).cloned().unwrap_or(Value::Null),
        );
    }
    out.insert("assets".to_string(), Value::Array(assets));
    Value::Object(out)
}

fn str_field<'a>(v: &'a Value, key: &str) -> Option<&'a str> {
    v.get(key).and_then(Value::as_str)
}

fn unexpected(reason: &str) -> ToolError {
    ToolError::UnexpectedResponse {
        service: "nexus".to_string(),
        reason: reason.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nexus_gateway::{ConnectionProfile, FailureKind};
    use nexus_mcp_test_support::{MockRoute, MockUpstream};

    fn args(v: Value) -> JsonObject {
        v.as_object().cloned().expect("object args")
    }

    fn client(base_url: &str, read_only: bool) -> GatewayClient {
        GatewayClient::new(
            ConnectionProfile::new("nexus", base_url)
                .with_credentials("admin", "admin123")
                .with_read_only(read_only),
        )
        .expect("client")
    }

    fn create_args(v: Value) -> CreateRepositoryArgs {
        serde_json::from_value(v).expect("create args")
    }

    #[test]
    fn maven_hosted_body_uses_defaults() {
        let body = repository_body(&create_args(json!({
            "name": "releases",
            "format": "maven",
            "type": "hosted"
        })))
        .expect("body");

        assert_eq!(body["name"], "releases");
        assert_eq!(body["online"], true);
        assert_eq!(body["storage"]["blobStoreName"], "default");
        assert_eq!(body["storage"]["strictContentTypeValidation"], true);
        assert_eq!(body["storage"]["writePolicy"], "allow_once");
        assert_eq!(body["maven"]["versionPolicy"], "RELEASE");
        assert_eq!(body["maven"]["layoutPolicy"], "STRICT");
        assert!(body.get("proxy").is_none());
    }

    #[test]
    fn proxy_body_requires_remote_url() {
        let err = repository_body(&create_args(json!({
            "name": "npm-proxy",
            "format": "npm",
            "type": "proxy"
        })))
        .expect_err("missing remote_url");
        assert_eq!(err.kind(), FailureKind::Validation);

        let body = repository_body(&create_args(json!({
            "name": "npm-proxy",
            "format": "npm",
            "type": "proxy",
            "remote_url": "https://registry.npmjs.org"
        })))
        .expect("body");
        assert_eq!(body["proxy"]["remoteUrl"], "https://registry.npmjs.org");
        assert_eq!(body["negativeCache"]["enabled"], true);
        assert!(body["storage"].get("writePolicy").is_none());
    }

    #[test]
    fn group_body_requires_members() {
        let err = repository_body(&create_args(json!({
            "name": "all",
            "format": "raw",
            "type": "group",
            "member_names": [" "]
        })))
        .expect_err("no members");
        assert!(err.to_string().contains("member_names"));

        let body = repository_body(&create_args(json!({
            "name": "docker-all",
            "format": "docker",
            "type": "group",
            "member_names": ["docker-hosted", "docker-hub"]
        })))
        .expect("body");
        assert_eq!(body["group"]["memberNames"], json!(["docker-hosted", "docker-hub"]));
        assert_eq!(body["docker"]["forceBasicAuth"], true);
    }

    #[test]
    fn unknown_format_is_rejected_by_deserialization() {
        let err = parse_args::<CreateRepositoryArgs>(
            CREATE_REPOSITORY,
            args(json!({"name": "x", "format": "cargo", "type": "hosted"})),
        )
        .expect_err("unknown format");
        assert_eq!(err.kind(), FailureKind::Validation);
    }

    #[test]
    fn apply_update_strips_read_only_fields_and_merges_changes() {
        let current = json!({
            "name": "releases",
            "format": "maven2",
            "type": "hosted",
            "url": "http://nexus/repository/releases",
            "online": true,
            "storage": {"blobStoreName": "default", "strictContentTypeValidation": true, "writePolicy": "allow_once"},
            "maven": {"versionPolicy": "RELEASE", "layoutPolicy": "STRICT"}
        });
        let update = UpdateRepositoryArgs {
            name: "releases".to_string(),
            online: Some(false),
            write_policy: Some(WritePolicy::Deny),
            ..Default::default()
        };

        let merged = apply_update(current, RepositoryType::Hosted, &update).expect("merged");
        assert!(merged.get("format").is_none());
        assert!(merged.get("type").is_none());
        assert!(merged.get("url").is_none());
        assert_eq!(merged["online"], false);
        assert_eq!(merged["storage"]["writePolicy"], "deny");
        assert_eq!(merged["storage"]["blobStoreName"], "default");
        assert_eq!(merged["maven"]["versionPolicy"], "RELEASE");
    }

    #[test]
    fn apply_update_drops_blank_member_names() {
        let update = UpdateRepositoryArgs {
            name: "maven-public".to_string(),
            member_names: Some(vec![
                " maven-releases ".to_string(),
                " ".to_string(),
                String::new(),
            ]),
            ..Default::default()
        };
        let merged = apply_update(
            json!({"name": "maven-public", "group": {"memberNames": ["maven-central"]}}),
            RepositoryType::Group,
            &update,
        )
        .expect("merged");
        assert_eq!(merged["group"]["memberNames"], json!(["maven-releases"]));

        let blank = UpdateRepositoryArgs {
            name: "maven-public".to_string(),
            member_names: Some(vec![" ".to_string(), String::new()]),
            ..Default::default()
        };
        let err = apply_update(json!({"name": "maven-public"}), RepositoryType::Group, &blank)
            .expect_err("only blank members");
        assert_eq!(err.kind(), FailureKind::Validation);
    }

    #[test]
    fn nuget_proxy_body_carries_nuget_settings() {
        let body = repository_body(&create_args(json!({
            "name": "nuget.org-proxy",
            "format": "nuget",
            "type": "proxy",
            "remote_url": "https://api.nuget.org/v3/index.json"
        })))
        .expect("body");
        assert_eq!(body["nugetProxy"]["nugetVersion"], "V3");
        assert_eq!(body["nugetProxy"]["queryCacheItemMaxAge"], 3600);

        let hosted = repository_body(&create_args(json!({
            "name": "nuget-hosted",
            "format": "nuget",
            "type": "hosted"
        })))
        .expect("body");
        assert!(hosted.get("nugetProxy").is_none());
    }

    #[test]
    fn apply_update_rejects_fields_for_the_wrong_type() {
        let update = UpdateRepositoryArgs {
            name: "central".to_string(),
            member_names: Some(vec!["a".to_string()]),
            ..Default::default()
        };
        let err = apply_update(json!({"name": "central"}), RepositoryType::Proxy, &update)
            .expect_err("members on proxy");
        assert_eq!(err.kind(), FailureKind::Validation);
    }

    #[tokio::test]
    async fn list_repositories_filters_and_shapes() {
        let upstream = MockUpstream::start(vec![MockRoute::json(
            Method::GET,
            "/service/rest/v1/repositories",
            200,
            json!([
                {"name": "maven-releases", "format": "maven2", "type": "hosted", "url": "http://n/repository/maven-releases", "attributes": {}},
                {"name": "maven-central", "format": "maven2", "type": "proxy", "url": "http://n/repository/maven-central", "attributes": {"proxy": {}}},
                {"name": "npm-hosted", "format": "npm", "type": "hosted", "url": "http://n/repository/npm-hosted", "attributes": {}}
            ]),
        )])
        .await
        .expect("mock upstream");
        let client = client(upstream.base_url(), false);

        let out = dispatch(
            &client,
            LIST_REPOSITORIES,
            args(json!({"format": "maven", "type": "hosted"})),
        )
        .await
        .expect("listing");
        assert_eq!(
            out,
            json!([{"name": "maven-releases", "format": "maven2", "type": "hosted", "url": "http://n/repository/maven-releases"}])
        );

        let all = dispatch(&client, LIST_REPOSITORIES, JsonObject::new())
            .await
            .expect("listing");
        assert_eq!(all.as_array().map(Vec::len), Some(3));
    }

    #[tokio::test]
    async fn create_repository_posts_to_format_and_type_path() {
        let upstream = MockUpstream::start(vec![
            MockRoute::new(Method::POST, "/service/rest/v1/repositories/raw/hosted").with_status(201),
        ])
        .await
        .expect("mock upstream");
        let client = client(upstream.base_url(), false);

        let out = dispatch(
            &client,
            CREATE_REPOSITORY,
            args(json!({"name": "files", "format": "raw", "type": "hosted", "write_policy": "allow"})),
        )
        .await
        .expect("created");
        assert_eq!(out["status"], "created");
        assert_eq!(out["repository"], "files");

        let requests = upstream.requests();
        assert_eq!(requests.len(), 1);
        let sent = requests[0].body_json().expect("json body");
        assert_eq!(sent["name"], "files");
        assert_eq!(sent["storage"]["writePolicy"], "allow");
    }

    #[tokio::test]
    async fn update_repository_fetches_then_puts_merged_settings() {
        let path = "/service/rest/v1/repositories/npm/proxy/npmjs";
        let upstream = MockUpstream::start(vec![
            MockRoute::json(
                Method::GET,
                path,
                200,
                json!({
                    "name": "npmjs",
                    "format": "npm",
                    "type": "proxy",
                    "url": "http://n/repository/npmjs",
                    "online": true,
                    "proxy": {"remoteUrl": "https://registry.npmjs.org", "contentMaxAge": 1440}
                }),
            ),
            MockRoute::new(Method::PUT, path).with_status(204),
        ])
        .await
        .expect("mock upstream");
        let client = client(upstream.base_url(), false);

        let out = dispatch(
            &client,
            UPDATE_REPOSITORY,
            args(json!({
                "name": "npmjs",
                "format": "npm",
                "type": "proxy",
                "remote_url": "https://mirror.example.com/npm"
            })),
        )
        .await
        .expect("updated");
        assert_eq!(out, json!({"status": "updated", "repository": "npmjs"}));

        let requests = upstream.requests();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0].method, "GET");
        assert_eq!(requests[1].method, "PUT");
        let sent = requests[1].body_json().expect("json body");
        assert!(sent.get("url").is_none());
        assert!(sent.get("format").is_none());
        assert_eq!(sent["proxy"]["remoteUrl"], "https://mirror.example.com/npm");
        assert_eq!(sent["proxy"]["contentMaxAge"], 1440);
    }

    #[tokio::test]
    async fn update_repository_in_read_only_mode_makes_no_calls() {
        let upstream = MockUpstream::start(Vec::new()).await.expect("mock upstream");
        let client = client(upstream.base_url(), true);

        let err = dispatch(
            &client,
            UPDATE_REPOSITORY,
            args(json!({"name": "r", "format": "raw", "type": "hosted", "online": false})),
        )
        .await
        .expect_err("read-only");
        assert_eq!(err.kind(), FailureKind::Authentication);
        assert!(err.to_string().contains("read-only mode"));
        assert_eq!(upstream.hits(), 0);
    }

    #[tokio::test]
    async fn update_without_changes_is_a_validation_error() {
        let upstream = MockUpstream::start(Vec::new()).await.expect("mock upstream");
        let client = client(upstream.base_url(), false);

        let err = dispatch(
            &client,
            UPDATE_REPOSITORY,
            args(json!({"name": "r", "format": "raw", "type": "hosted"})),
        )
        .await
        .expect_err("no changes");
        assert_eq!(err.kind(), FailureKind::Validation);
        assert_eq!(upstream.hits(), 0);
    }

    #[tokio::test]
    async fn delete_repository_confirms_and_encodes_name() {
        let upstream = MockUpstream::start(vec![
            MockRoute::new(Method::DELETE, "/service/rest/v1/repositories/my%20repo").with_status(204),
        ])
        .await
        .expect("mock upstream");
        let client = client(upstream.base_url(), false);

        let out = dispatch(&client, DELETE_REPOSITORY, args(json!({"name": "my repo"})))
            .await
            .expect("deleted");
        assert_eq!(out, json!({"status": "deleted", "repository": "my repo"}));

        let requests = upstream.requests();
        assert_eq!(requests[0].method, "DELETE");
        assert_eq!(requests[0].path, "/service/rest/v1/repositories/my%20repo");
    }

    #[tokio::test]
    async fn delete_in_read_only_mode_makes_no_calls() {
        let upstream = MockUpstream::start(Vec::new()).await.expect("mock upstream");
        let client = client(upstream.base_url(), true);

        for (tool, a) in [
            (DELETE_REPOSITORY, json!({"name": "r"})),
            (DELETE_COMPONENT, json!({"id": "abc"})),
            (RUN_TASK, json!({"id": "task-1"})),
        ] {
            let err = dispatch(&client, tool, args(a)).await.expect_err("read-only");
            assert_eq!(err.kind(), FailureKind::Authentication, "{tool}");
            assert_eq!(err.status(), 0);
        }
        assert_eq!(upstream.hits(), 0);
    }

    #[tokio::test]
    async fn search_requires_a_criterion() {
        let upstream = MockUpstream::start(Vec::new()).await.expect("mock upstream");
        let client = client(upstream.base_url(), false);

        let err = dispatch(
            &client,
            SEARCH_COMPONENTS,
            args(json!({"continuation_token": "abc"})),
        )
        .await
        .expect_err("no criterion");
        assert_eq!(err.kind(), FailureKind::Validation);
        assert_eq!(upstream.hits(), 0);
    }

    #[tokio::test]
    async fn search_sends_query_and_shapes_components() {
        let upstream = MockUpstream::start(vec![MockRoute::json(
            Method::GET,
            "/service/rest/v1/search",
            200,
            json!({
                "items": [{
                    "id": "bWF2ZW4",
                    "repository": "maven-central",
                    "format": "maven2",
                    "group": "org.slf4j",
                    "name": "slf4j-api",
                    "version": "2.0.9",
                    "assets": [
                        {"path": "org/slf4j/slf4j-api/2.0.9/slf4j-api-2.0.9.jar", "checksum": {"sha1": "x"}},
                        {"path": "org/slf4j/slf4j-api/2.0.9/slf4j-api-2.0.9.pom"}
                    ]
                }],
                "continuationToken": "next-page"
            }),
        )])
        .await
        .expect("mock upstream");
        let client = client(upstream.base_url(), false);

        let out = dispatch(
            &client,
            SEARCH_COMPONENTS,
            args(json!({"format": "maven", "keyword": "slf4j"})),
        )
        .await
        .expect("search");

        assert_eq!(out["continuationToken"], "next-page");
        assert_eq!(out["items"][0]["name"], "slf4j-api");
        assert_eq!(
            out["items"][0]["assets"],
            json!([
                "org/slf4j/slf4j-api/2.0.9/slf4j-api-2.0.9.jar",
                "org/slf4j/slf4j-api/2.0.9/slf4j-api-2.0.9.pom"
            ])
        );

        let requests = upstream.requests();
        assert_eq!(requests[0].query_value("q").as_deref(), Some("slf4j"));
        assert_eq!(requests[0].query_value("format").as_deref(), Some("maven2"));
        assert_eq!(requests[0].query_value("continuationToken"), None);
    }

    #[tokio::test]
    async fn list_components_passes_continuation_token() {
        let upstream = MockUpstream::start(vec![MockRoute::json(
            Method::GET,
            "/service/rest/v1/components",
            200,
            json!({"items": [], "continuationToken": null}),
        )])
        .await
        .expect("mock upstream");
        let client = client(upstream.base_url(), false);

        let out = dispatch(
            &client,
            LIST_COMPONENTS,
            args(json!({"repository": "raw-hosted", "continuation_token": "tok"})),
        )
        .await
        .expect("page");
        assert_eq!(out, json!({"items": [], "continuationToken": null}));

        let requests = upstream.requests();
        assert_eq!(requests[0].query_value("repository").as_deref(), Some("raw-hosted"));
        assert_eq!(requests[0].query_value("continuationToken").as_deref(), Some("tok"));
    }

    #[tokio::test]
    async fn get_repository_not_found_keeps_upstream_body() {
        let upstream = MockUpstream::start(vec![MockRoute::json(
            Method::GET,
            "/service/rest/v1/repositories/missing",
            404,
            json!({"message": "Repository not found"}),
        )])
        .await
        .expect("mock upstream");
        let client = client(upstream.base_url(), false);

        let err = dispatch(&client, GET_REPOSITORY, args(json!({"name": "missing"})))
            .await
            .expect_err("404");
        assert_eq!(err.kind(), FailureKind::NotFound);
        assert_eq!(err.status(), 404);
        let ToolError::Gateway(gw) = err else {
            panic!("expected gateway error");
        };
        assert_eq!(gw.body(), Some(&json!({"message": "Repository not found"})));
    }

    #[tokio::test]
    async fn list_users_sends_optional_filters() {
        let upstream = MockUpstream::start(vec![MockRoute::json(
            Method::GET,
            "/service/rest/v1/security/users",
            200,
            json!([{"userId": "admin", "source": "default"}]),
        )])
        .await
        .expect("mock upstream");
        let client = client(upstream.base_url(), false);

        dispatch(
            &client,
            LIST_USERS,
            args(json!({"user_id": "adm", "source": " "})),
        )
        .await
        .expect("users");
        let requests = upstream.requests();
        assert_eq!(requests[0].query_value("userId").as_deref(), Some("adm"));
        assert_eq!(requests[0].query_value("source"), None);
    }
}
