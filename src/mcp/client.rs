//! MCP client over the streamable-HTTP transport.
//!
//! One POST per JSON-RPC message. The server may answer with plain JSON or
//! a short `text/event-stream`; both are handled by
//! [`protocol::parse_response_body`].

use crate::error::{RegistryError, ToolError};
use crate::mcp::protocol::{
    self, CallToolResult, JsonRpcNotification, JsonRpcRequest, McpToolInfo, ToolsListResult,
    MCP_PROTOCOL_VERSION, SESSION_HEADER,
};
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::StatusCode;
use serde::Serialize;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tracing::{debug, info};

/// Upper bound on `tools/list` pages followed during discovery.
const MAX_LIST_PAGES: usize = 32;

/// Connection settings for one MCP server.
#[derive(Debug, Clone)]
pub struct McpServerConfig {
    pub url: String,
    pub api_key: String,
    /// Per-request HTTP timeout.
    pub timeout: Duration,
}

/// An initialized MCP session. Immutable once built; the request counter is
/// the only interior state.
#[derive(Debug)]
pub struct McpClient {
    url: String,
    api_key: String,
    session_id: Option<String>,
    next_id: AtomicU64,
    http: reqwest::Client,
}

/// Failure of a single JSON-RPC exchange, before it is mapped onto the
/// discovery or tool-call taxonomy.
#[derive(Debug)]
enum RpcFailure {
    Transport(String),
    Status { status: StatusCode, body: String },
    Protocol(String),
}

impl From<RpcFailure> for RegistryError {
    fn from(f: RpcFailure) -> Self {
        match f {
            RpcFailure::Transport(msg) => Self::Connection(msg),
            RpcFailure::Status { status, .. }
                if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN =>
            {
                Self::Auth {
                    status: status.as_u16(),
                }
            }
            RpcFailure::Status { status, body } => Self::Protocol(format!("HTTP {status}: {body}")),
            RpcFailure::Protocol(msg) => Self::Protocol(msg),
        }
    }
}

impl RpcFailure {
    fn into_tool_error(self, tool: &str) -> ToolError {
        let message = match self {
            Self::Transport(msg) => format!("tool server unreachable: {msg}"),
            Self::Status { status, body } => format!("HTTP {status}: {body}"),
            Self::Protocol(msg) => msg,
        };
        ToolError::Invocation {
            tool: tool.to_string(),
            message,
        }
    }
}

impl McpClient {
    /// Perform the `initialize` handshake and return a ready session.
    pub async fn connect(config: &McpServerConfig) -> Result<Self, RegistryError> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()?;

        let mut client = Self {
            url: config.url.clone(),
            api_key: config.api_key.clone(),
            session_id: None,
            next_id: AtomicU64::new(1),
            http,
        };

        let id = client.next_request_id();
        let request = JsonRpcRequest::new(id, "initialize").with_params(json!({
            "protocolVersion": MCP_PROTOCOL_VERSION,
            "capabilities": {},
            "clientInfo": {
                "name": env!("CARGO_PKG_NAME"),
                "version": env!("CARGO_PKG_VERSION"),
            }
        }));

        let resp = client.post(&request).await?;
        client.session_id = resp
            .headers()
            .get(SESSION_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        let result = client.read_result(resp, id).await?;
        let server_name = result
            .pointer("/serverInfo/name")
            .and_then(Value::as_str)
            .unwrap_or("unknown");
        info!(
            "MCP session established with '{}' (session: {})",
            server_name,
            client.session_id.as_deref().unwrap_or("none")
        );

        client.notify("notifications/initialized").await?;
        Ok(client)
    }

    /// List every tool the server exposes, following pagination cursors.
    pub async fn list_tools(&self) -> Result<Vec<McpToolInfo>, RegistryError> {
        let mut tools = Vec::new();
        let mut cursor: Option<String> = None;

        for _ in 0..MAX_LIST_PAGES {
            let params = match &cursor {
                Some(c) => json!({ "cursor": c }),
                None => json!({}),
            };
            let result = self.request("tools/list", params).await?;
            let page: ToolsListResult = serde_json::from_value(result)
                .map_err(|e| RegistryError::Protocol(format!("bad tools/list result: {e}")))?;

            tools.extend(page.tools);
            match page.next_cursor {
                Some(next) if !next.is_empty() => cursor = Some(next),
                _ => return Ok(tools),
            }
        }

        Err(RegistryError::Protocol(format!(
            "tools/list did not terminate after {MAX_LIST_PAGES} pages"
        )))
    }

    /// Invoke a tool and return its text output.
    pub async fn call_tool(&self, name: &str, arguments: &Value) -> Result<String, ToolError> {
        debug!("MCP tools/call: {}", name);

        let value = self
            .request(
                "tools/call",
                json!({ "name": name, "arguments": arguments }),
            )
            .await
            .map_err(|f| f.into_tool_error(name))?;

        let result: CallToolResult =
            serde_json::from_value(value).map_err(|e| ToolError::Invocation {
                tool: name.to_string(),
                message: format!("bad tools/call result: {e}"),
            })?;

        if result.is_error {
            return Err(ToolError::Invocation {
                tool: name.to_string(),
                message: result.text(),
            });
        }
        Ok(result.text())
    }

    pub fn session_id(&self) -> Option<&str> {
        self.session_id.as_deref()
    }

    fn next_request_id(&self) -> u64 {
        self.next_id.fetch_add(1, Ordering::Relaxed)
    }

    async fn request(&self, method: &str, params: Value) -> Result<Value, RpcFailure> {
        let id = self.next_request_id();
        let request = JsonRpcRequest::new(id, method).with_params(params);
        let resp = self.post(&request).await?;
        self.read_result(resp, id).await
    }

    async fn notify(&self, method: &str) -> Result<(), RpcFailure> {
        let resp = self.post(&JsonRpcNotification::new(method)).await?;
        // Servers answer notifications with 202 and no body.
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(RpcFailure::Status { status, body });
        }
        Ok(())
    }

    async fn post<T: Serialize>(&self, body: &T) -> Result<reqwest::Response, RpcFailure> {
        let mut builder = self
            .http
            .post(&self.url)
            .header(ACCEPT, "application/json, text/event-stream")
            .header(CONTENT_TYPE, "application/json")
            .json(body);
        if !self.api_key.is_empty() {
            builder = builder.bearer_auth(&self.api_key);
        }
        if let Some(session) = &self.session_id {
            builder = builder.header(SESSION_HEADER, session);
        }

        builder
            .send()
            .await
            .map_err(|e| RpcFailure::Transport(e.to_string()))
    }

    async fn read_result(&self, resp: reqwest::Response, id: u64) -> Result<Value, RpcFailure> {
        let status = resp.status();
        let body = resp
            .text()
            .await
            .map_err(|e| RpcFailure::Transport(e.to_string()))?;

        if !status.is_success() {
            return Err(RpcFailure::Status { status, body });
        }

        let message = protocol::parse_response_body(&body, id).ok_or_else(|| {
            RpcFailure::Protocol(format!("no JSON-RPC response with id {id} in body"))
        })?;

        if let Some(err) = message.error {
            return Err(RpcFailure::Protocol(format!(
                "JSON-RPC error {}: {}",
                err.code, err.message
            )));
        }
        message
            .result
            .ok_or_else(|| RpcFailure::Protocol(format!("response {id} has no result")))
    }
}
