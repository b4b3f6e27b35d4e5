//! Immutable service context built once at startup and shared by every request.

use crate::agent::{Investigator, RunLimits};
use crate::config::SentinelConfig;
use crate::error::RegistryError;
use crate::inference::{ChatModel, InferenceClient, ModelSettings};
use crate::mcp::McpServerConfig;
use crate::tools::{self, ToolRegistry};
use crate::validation::Validator;
use std::sync::Arc;
use tracing::info;

/// Everything a request handler needs. Holds no mutable state.
pub struct ServiceContext {
    pub config: SentinelConfig,
    pub registry: Arc<ToolRegistry>,
    pub investigator: Investigator,
    pub validator: Validator,
}

impl ServiceContext {
    /// Discover tools and build the model clients. Must finish before any
    /// request is accepted; failure means the service does not start.
    pub async fn initialize(config: SentinelConfig) -> Result<Self, RegistryError> {
        info!("Discovering tools from {}", config.mcp_server_url);

        let server = McpServerConfig {
            url: config.mcp_server_url.clone(),
            api_key: config.mcp_api_key.clone(),
            timeout: config.tool_timeout().max(config.discovery_timeout()),
        };
        let registry = tools::discover(&server, config.discovery_timeout(), config.tool_timeout())
            .await?;

        Ok(Self::from_parts(
            config.clone(),
            Arc::new(registry),
            Arc::new(investigator_client(&config)),
            Arc::new(validator_client(&config)),
        ))
    }

    /// Assemble a context from already-built parts.
    pub fn from_parts(
        config: SentinelConfig,
        registry: Arc<ToolRegistry>,
        investigator_model: Arc<dyn ChatModel>,
        validator_model: Arc<dyn ChatModel>,
    ) -> Self {
        let limits = RunLimits {
            max_steps: config.max_steps,
            max_duration: config.max_run_duration(),
        };
        Self {
            investigator: Investigator::new(investigator_model, registry.clone(), limits),
            validator: Validator::new(validator_model),
            registry,
            config,
        }
    }
}

/// Client for the generative model driving investigations.
pub fn investigator_client(config: &SentinelConfig) -> InferenceClient {
    InferenceClient::new(
        &config.inference_api_url,
        &config.inference_api_key,
        ModelSettings {
            model: config.investigator_model.clone(),
            max_tokens: config.max_tokens_per_turn,
            temperature: config.investigator_temperature,
        },
        config.inference_timeout(),
    )
}

/// Client for the classifier. Replies are a single token, so output is capped.
pub fn validator_client(config: &SentinelConfig) -> InferenceClient {
    InferenceClient::new(
        &config.inference_api_url,
        &config.inference_api_key,
        ModelSettings {
            model: config.validator_model.clone(),
            max_tokens: 16,
            temperature: config.validator_temperature,
        },
        config.inference_timeout(),
    )
}
