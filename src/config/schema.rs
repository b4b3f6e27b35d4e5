//! Configuration schema for sentinel.toml.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SentinelConfig {
    /// Address the HTTP façade binds to.
    pub listen_addr: String,

    /// OpenAI-compatible inference base URL (including the `/v1` prefix).
    pub inference_api_url: String,

    /// Bearer token for the inference service. Empty means no auth header.
    pub inference_api_key: String,

    /// Model driving the investigation agent.
    pub investigator_model: String,

    /// Model classifying reports.
    pub validator_model: String,

    /// Maximum tokens per inference turn.
    pub max_tokens_per_turn: u32,

    pub investigator_temperature: f64,

    pub validator_temperature: f64,

    /// MCP streamable-HTTP endpoint of the reporting tool server.
    pub mcp_server_url: String,

    /// Bearer token for the tool server.
    pub mcp_api_key: String,

    /// Maximum tool steps per investigation.
    pub max_steps: u32,

    /// Wall-clock budget for one investigation.
    pub max_run_seconds: u64,

    pub inference_timeout_secs: u64,

    pub tool_timeout_secs: u64,

    pub discovery_timeout_secs: u64,

    /// Log level (debug, info, warn, error).
    pub log_level: String,

    /// Config version.
    pub version: u32,
}

impl Default for SentinelConfig {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:5050".into(),
            inference_api_url: "http://127.0.0.1:8000/v1".into(),
            inference_api_key: String::new(),
            investigator_model: "meta/llama-3.1-8b-instruct".into(),
            validator_model: "meta/llama-3.1-8b-instruct".into(),
            max_tokens_per_turn: 2048,
            investigator_temperature: 0.2,
            validator_temperature: 0.0,
            mcp_server_url: "http://127.0.0.1:4444/mcp".into(),
            mcp_api_key: String::new(),
            max_steps: 12,
            max_run_seconds: 180,
            inference_timeout_secs: 60,
            tool_timeout_secs: 30,
            discovery_timeout_secs: 15,
            log_level: "info".into(),
            version: 1,
        }
    }
}

impl SentinelConfig {
    pub fn max_run_duration(&self) -> Duration {
        Duration::from_secs(self.max_run_seconds)
    }

    pub fn inference_timeout(&self) -> Duration {
        Duration::from_secs(self.inference_timeout_secs)
    }

    pub fn tool_timeout(&self) -> Duration {
        Duration::from_secs(self.tool_timeout_secs)
    }

    pub fn discovery_timeout(&self) -> Duration {
        Duration::from_secs(self.discovery_timeout_secs)
    }

    /// Apply overrides from a variable lookup (normally the process environment).
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(v) = non_empty("MCP_API_KEY") {
            self.mcp_api_key = v;
        }
        if let Some(v) = non_empty("MCP_SERVER_URL") {
            self.mcp_server_url = v;
        }
        if let Some(v) = non_empty("INFERENCE_API_KEY") {
            self.inference_api_key = v;
        }
        if let Some(v) = non_empty("INFERENCE_API_URL") {
            self.inference_api_url = v;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn partial_file_keeps_defaults() {
        let cfg: SentinelConfig = toml::from_str(
            r#"
            mcp_server_url = "http://tools.internal:4444/servers/abc/mcp"
            max_steps = 4
            "#,
        )
        .unwrap();

        assert_eq!(cfg.mcp_server_url, "http://tools.internal:4444/servers/abc/mcp");
        assert_eq!(cfg.max_steps, 4);
        assert_eq!(cfg.listen_addr, "0.0.0.0:5050");
        assert_eq!(cfg.max_run_duration(), Duration::from_secs(180));
    }

    #[test]
    fn overrides_replace_only_non_empty_values() {
        let env: HashMap<&str, &str> = [
            ("MCP_API_KEY", "secret-token"),
            ("INFERENCE_API_URL", "   "),
        ]
        .into_iter()
        .collect();

        let mut cfg = SentinelConfig::default();
        cfg.apply_overrides(|k| env.get(k).map(|v| v.to_string()));

        assert_eq!(cfg.mcp_api_key, "secret-token");
        assert_eq!(cfg.inference_api_url, "http://127.0.0.1:8000/v1");
    }
}
