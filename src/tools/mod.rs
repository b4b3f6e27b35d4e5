//! Tool registry: a name → handle map built once at startup and read-only
//! afterwards.
//!
//! Discovery happens exactly once per process. Tools added or removed on the
//! remote server afterwards are not observed until restart.

pub mod remote;
pub mod traits;

pub use remote::RemoteTool;
pub use traits::{Tool, ToolDefinition};

use crate::error::{RegistryError, ToolError};
use crate::mcp::{McpClient, McpServerConfig};
use crate::types::ToolCall;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Registry of callable tools.
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn Tool>>,
    definitions: Vec<ToolDefinition>,
    call_timeout: Duration,
}

impl ToolRegistry {
    /// Build a registry from already-constructed tools. Later duplicates
    /// replace earlier ones.
    pub fn from_tools(tools: Vec<Arc<dyn Tool>>, call_timeout: Duration) -> Self {
        let mut map: HashMap<String, Arc<dyn Tool>> = HashMap::new();
        for tool in tools {
            if map.insert(tool.name().to_string(), tool.clone()).is_some() {
                warn!("Duplicate tool '{}' — keeping the last definition", tool.name());
            }
        }

        let mut definitions: Vec<ToolDefinition> = map.values().map(|t| t.definition()).collect();
        definitions.sort_by(|a, b| a.name.cmp(&b.name));

        Self {
            tools: map,
            definitions,
            call_timeout,
        }
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn Tool>> {
        self.tools.get(name)
    }

    /// Definitions advertised to the model, sorted by name.
    pub fn definitions(&self) -> &[ToolDefinition] {
        &self.definitions
    }

    pub fn names(&self) -> Vec<&str> {
        self.definitions.iter().map(|d| d.name.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Look up, check, and invoke a tool under the per-call timeout.
    pub async fn invoke(&self, call: &ToolCall) -> Result<String, ToolError> {
        let tool = self
            .get(&call.name)
            .ok_or_else(|| ToolError::UnknownTool(call.name.clone()))?;

        check_arguments(tool.parameters_schema(), &call.arguments).map_err(|reason| {
            ToolError::InvalidArguments {
                tool: call.name.clone(),
                reason,
            }
        })?;

        match tokio::time::timeout(self.call_timeout, tool.execute(&call.arguments)).await {
            Ok(result) => result,
            Err(_) => Err(ToolError::Timeout {
                tool: call.name.clone(),
                after: self.call_timeout,
            }),
        }
    }
}

/// Connect to the MCP server and build the registry from its tool list.
pub async fn discover(
    server: &McpServerConfig,
    discovery_timeout: Duration,
    call_timeout: Duration,
) -> Result<ToolRegistry, RegistryError> {
    let work = async {
        let client = Arc::new(McpClient::connect(server).await?);
        let infos = client.list_tools().await?;
        let tools: Vec<Arc<dyn Tool>> = infos
            .into_iter()
            .map(|info| Arc::new(RemoteTool::new(info, client.clone())) as Arc<dyn Tool>)
            .collect();
        Ok::<_, RegistryError>(tools)
    };

    let tools = tokio::time::timeout(discovery_timeout, work)
        .await
        .map_err(|_| RegistryError::Timeout(discovery_timeout))??;

    let registry = ToolRegistry::from_tools(tools, call_timeout);
    info!(
        "Discovered {} tool(s): {}",
        registry.len(),
        registry.names().join(", ")
    );
    Ok(registry)
}

/// Check that `args` is an object carrying every property the schema lists
/// as `required`.
pub fn check_arguments(schema: &Value, args: &Value) -> Result<(), String> {
    let Some(obj) = args.as_object() else {
        return Err(format!("expected a JSON object, got {args}"));
    };

    let missing: Vec<&str> = schema
        .get("required")
        .and_then(Value::as_array)
        .map(|req| {
            req.iter()
                .filter_map(Value::as_str)
                .filter(|key| !obj.contains_key(*key))
                .collect()
        })
        .unwrap_or_default();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(format!("missing required argument(s): {}", missing.join(", ")))
    }
}
