pub mod client;

pub use client::{InferenceClient, ModelSettings};

use crate::error::InferenceError;
use crate::tools::ToolDefinition;
use crate::types::{ChatMessage, InferenceResponse};
use async_trait::async_trait;

/// A generative model the agent loop and validator can talk to.
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// One chat-completion round trip. `tools` may be empty.
    async fn chat(
        &self,
        messages: &[ChatMessage],
        tools: &[ToolDefinition],
    ) -> Result<InferenceResponse, InferenceError>;
}
