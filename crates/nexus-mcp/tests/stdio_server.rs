use anyhow::Context as _;
use nexus_mcp_test_support::{MockRoute, MockUpstream};
use reqwest::Method;
use serde_json::{Value, json};
use std::process::Stdio;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt as _, AsyncWriteExt as _, BufReader, Lines};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};

/// A spawned `nexus-mcp` process spoken to over newline-delimited JSON-RPC.
struct StdioSession {
    _child: Child,
    stdin: ChildStdin,
    stdout: Lines<BufReader<ChildStdout>>,
}

impl StdioSession {
    async fn spawn(args: &[&str]) -> anyhow::Result<Self> {
        let mut child = Command::new(env!("CARGO_BIN_EXE_nexus-mcp"))
            .args(args)
            .args(["--log-level", "debug"])
            .env_clear()
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .context("spawn nexus-mcp")?;

        let stdin = child.stdin.take().context("child stdin")?;
        let stdout = child.stdout.take().context("child stdout")?;
        let mut session = Self {
            _child: child,
            stdin,
            stdout: BufReader::new(stdout).lines(),
        };

        let init = session
            .request(
                0,
                "initialize",
                json!({
                    "protocolVersion": "2024-11-05",
                    "capabilities": {},
                    "clientInfo": {"name": "stdio-test", "version": "0"}
                }),
            )
            .await?;
        anyhow::ensure!(
            init.pointer("/result/serverInfo/name") == Some(&json!("nexus-mcp")),
            "unexpected initialize response: {init}"
        );
        session
            .send(&json!({"jsonrpc": "2.0", "method": "notifications/initialized"}))
            .await?;
        Ok(session)
    }

    async fn send(&mut self, msg: &Value) -> anyhow::Result<()> {
        let mut line = serde_json::to_string(msg)?;
        line.push('\n');
        self.stdin.write_all(line.as_bytes()).await?;
        self.stdin.flush().await?;
        Ok(())
    }

    async fn request(&mut self, id: u64, method: &str, params: Value) -> anyhow::Result<Value> {
        self.send(&json!({"jsonrpc": "2.0", "id": id, "method": method, "params": params}))
            .await?;

        loop {
            let line = tokio::time::timeout(Duration::from_secs(10), self.stdout.next_line())
                .await
                .context("timed out waiting for response")??
                .context("server closed stdout")?;
            let msg: Value = serde_json::from_str(&line).context("parse server message")?;
            if msg.get("id") == Some(&json!(id)) {
                return Ok(msg);
            }
        }
    }

    async fn call_tool(&mut self, id: u64, name: &str, arguments: Value) -> anyhow::Result<Value> {
        self.request(id, "tools/call", json!({"name": name, "arguments": arguments}))
            .await
    }
}

fn repositories_route() -> MockRoute {
    MockRoute::json(
        Method::GET,
        "/service/rest/v1/repositories",
        200,
        json!([
            {"name": "maven-releases", "format": "maven2", "type": "hosted", "url": "http://n/repository/maven-releases"},
            {"name": "npm-proxy", "format": "npm", "type": "proxy", "url": "http://n/repository/npm-proxy"}
        ]),
    )
}

#[tokio::test]
async fn read_only_session_lists_and_blocks_mutations() -> anyhow::Result<()> {
    let upstream = MockUpstream::start(vec![repositories_route()]).await?;
    let mut session = StdioSession::spawn(&[
        "--nexus-url",
        upstream.base_url(),
        "--nexus-username",
        "admin",
        "--nexus-password",
        "admin123",
        "--read-only",
    ])
    .await?;

    let list = session.request(1, "tools/list", json!({})).await?;
    let tools = list
        .pointer("/result/tools")
        .and_then(Value::as_array)
        .context("tools/list result")?;
    assert!(tools.iter().any(|t| t["name"] == "nexus_list_repositories"));
    assert!(!tools.iter().any(|t| t["name"] == "firewall_evaluate_component"));

    let repos = session
        .call_tool(2, "nexus_list_repositories", json!({"format": "npm"}))
        .await?;
    assert_eq!(repos.pointer("/result/isError"), Some(&json!(false)));
    let text = repos
        .pointer("/result/content/0/text")
        .and_then(Value::as_str)
        .context("text content")?;
    let listed: Value = serde_json::from_str(text)?;
    assert_eq!(listed[0]["name"], "npm-proxy");
    assert_eq!(
        upstream.requests()[0].authorization.as_deref(),
        Some("Basic YWRtaW46YWRtaW4xMjM=")
    );

    let hits_before = upstream.hits();
    let deleted = session
        .call_tool(3, "nexus_delete_repository", json!({"name": "npm-proxy"}))
        .await?;
    assert_eq!(deleted.pointer("/result/isError"), Some(&json!(true)));
    assert_eq!(
        deleted.pointer("/result/structuredContent/error/kind"),
        Some(&json!("authentication"))
    );
    let message = deleted
        .pointer("/result/content/0/text")
        .and_then(Value::as_str)
        .context("error text")?;
    assert!(message.contains("read-only mode"));
    assert_eq!(upstream.hits(), hits_before);

    let unknown = session.call_tool(4, "nexus_no_such_tool", json!({})).await?;
    assert!(unknown.get("error").is_some(), "expected JSON-RPC error: {unknown}");

    Ok(())
}

#[tokio::test]
async fn session_without_credentials_still_probes() -> anyhow::Result<()> {
    let upstream = MockUpstream::start(vec![
        MockRoute::new(Method::GET, "/service/rest/v1/status"),
        repositories_route(),
    ])
    .await?;
    let mut session = StdioSession::spawn(&["--nexus-url", upstream.base_url()]).await?;

    let repos = session
        .call_tool(1, "nexus_list_repositories", json!({}))
        .await?;
    assert_eq!(repos.pointer("/result/isError"), Some(&json!(true)));
    assert_eq!(
        repos.pointer("/result/structuredContent/error/kind"),
        Some(&json!("configuration"))
    );
    assert_eq!(upstream.hits(), 0);

    let status = session
        .call_tool(2, "nexus_check_connectivity", json!({}))
        .await?;
    let text = status
        .pointer("/result/content/0/text")
        .and_then(Value::as_str)
        .context("text content")?;
    let parsed: Value = serde_json::from_str(text)?;
    assert_eq!(parsed["nexus"]["reachable"], true);
    assert_eq!(parsed["firewall"], Value::Null);
    assert_eq!(upstream.requests()[0].authorization, None);

    Ok(())
}
