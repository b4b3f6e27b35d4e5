//! Tools backed by a remote MCP server.

use crate::error::ToolError;
use crate::mcp::{McpClient, McpToolInfo};
use crate::tools::Tool;
use async_trait::async_trait;
use std::sync::Arc;

/// A tool discovered over MCP; invocation is a `tools/call` on the shared session.
pub struct RemoteTool {
    name: String,
    description: String,
    schema: serde_json::Value,
    client: Arc<McpClient>,
}

impl RemoteTool {
    pub fn new(info: McpToolInfo, client: Arc<McpClient>) -> Self {
        Self {
            description: info
                .description
                .unwrap_or_else(|| format!("Remote tool '{}'", info.name)),
            name: info.name,
            schema: info.input_schema,
            client,
        }
    }
}

#[async_trait]
impl Tool for RemoteTool {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn parameters_schema(&self) -> &serde_json::Value {
        &self.schema
    }

    async fn execute(&self, args: &serde_json::Value) -> Result<String, ToolError> {
        self.client.call_tool(&self.name, args).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mcp::client::tests::{config, spawn_fake_server};
    use serde_json::json;

    #[tokio::test]
    async fn executes_through_the_session() {
        let url = spawn_fake_server(false, false).await;
        let client = Arc::new(McpClient::connect(&config(url, "good-token")).await.unwrap());
        let info = client.list_tools().await.unwrap().remove(0);

        let tool = RemoteTool::new(info, client);
        assert_eq!(tool.description(), "Remote tool 'get_domain_report'");

        let out = tool.execute(&json!({"domain": "evil-site.co"})).await.unwrap();
        assert_eq!(out, "evil-site.co: 0/94 vendors flagged");
    }
}
