//! Model inference over an OpenAI-compatible chat-completions API.
//!
//! Supports tool-use (function calling) in the OpenAI format.

use crate::error::InferenceError;
use crate::inference::ChatModel;
use crate::tools::ToolDefinition;
use crate::types::*;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

/// Per-client model selection.
#[derive(Debug, Clone)]
pub struct ModelSettings {
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f64,
}

/// Inference client for one model.
#[derive(Debug, Clone)]
pub struct InferenceClient {
    base_url: String,
    api_key: String,
    settings: ModelSettings,
    timeout: Duration,
    http: reqwest::Client,
}

// -- OpenAI-compatible request/response types --------------------------------

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<MessagePayload>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<Vec<ToolPayload<'a>>>,
    max_tokens: u32,
    temperature: f64,
}

#[derive(Debug, Serialize)]
struct MessagePayload {
    role: &'static str,
    content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_calls: Option<Vec<ToolCallPayload>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_call_id: Option<String>,
}

#[derive(Debug, Serialize)]
struct ToolPayload<'a> {
    r#type: &'a str,
    function: FunctionPayload<'a>,
}

#[derive(Debug, Serialize)]
struct FunctionPayload<'a> {
    name: &'a str,
    description: &'a str,
    parameters: &'a serde_json::Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ToolCallPayload {
    #[serde(default)]
    id: String,
    #[serde(default = "function_type")]
    r#type: String,
    function: FunctionCallPayload,
}

fn function_type() -> String {
    "function".into()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct FunctionCallPayload {
    name: String,
    /// A JSON-encoded string on the wire, though some servers send the object.
    #[serde(default)]
    arguments: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
    usage: Option<UsagePayload>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
    #[serde(default)]
    tool_calls: Vec<ToolCallPayload>,
}

#[derive(Debug, Deserialize)]
struct UsagePayload {
    #[serde(default)]
    prompt_tokens: u32,
    #[serde(default)]
    completion_tokens: u32,
    #[serde(default)]
    total_tokens: u32,
}

impl InferenceClient {
    /// Create a new inference client.
    pub fn new(base_url: &str, api_key: &str, settings: ModelSettings, timeout: Duration) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            settings,
            timeout,
            http: reqwest::Client::new(),
        }
    }

    pub fn model(&self) -> &str {
        &self.settings.model
    }

    async fn send(&self, request: &ChatRequest<'_>) -> Result<ChatResponse, InferenceError> {
        let url = format!("{}/chat/completions", self.base_url);

        let mut builder = self.http.post(&url).json(request);
        if !self.api_key.is_empty() {
            builder = builder.bearer_auth(&self.api_key);
        }

        let resp = builder.send().await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(InferenceError::Http {
                status: status.as_u16(),
                body,
            });
        }

        resp.json()
            .await
            .map_err(|e| InferenceError::ResponseFormat(e.to_string()))
    }
}

#[async_trait]
impl ChatModel for InferenceClient {
    async fn chat(
        &self,
        messages: &[ChatMessage],
        tools: &[ToolDefinition],
    ) -> Result<InferenceResponse, InferenceError> {
        let request = ChatRequest {
            model: &self.settings.model,
            messages: messages.iter().map(to_payload).collect(),
            tools: to_tool_payloads(tools),
            max_tokens: self.settings.max_tokens,
            temperature: self.settings.temperature,
        };

        debug!(
            "Inference request to model {} ({} messages, {} tools)",
            self.settings.model,
            messages.len(),
            tools.len()
        );

        let body = tokio::time::timeout(self.timeout, self.send(&request))
            .await
            .map_err(|_| InferenceError::Timeout(self.timeout))??;

        decode_response(body)
    }
}

fn to_payload(m: &ChatMessage) -> MessagePayload {
    let tool_calls = if m.tool_calls.is_empty() {
        None
    } else {
        Some(
            m.tool_calls
                .iter()
                .map(|tc| ToolCallPayload {
                    id: tc.id.clone(),
                    r#type: function_type(),
                    function: FunctionCallPayload {
                        name: tc.name.clone(),
                        arguments: serde_json::Value::String(tc.arguments.to_string()),
                    },
                })
                .collect(),
        )
    };

    // Assistant turns that only carry tool calls send a null content.
    let content = if tool_calls.is_some() && m.content.is_empty() {
        None
    } else {
        Some(m.content.clone())
    };

    MessagePayload {
        role: m.role.as_str(),
        content,
        tool_calls,
        tool_call_id: m.tool_call_id.clone(),
    }
}

fn to_tool_payloads(tools: &[ToolDefinition]) -> Option<Vec<ToolPayload<'_>>> {
    if tools.is_empty() {
        return None;
    }
    Some(
        tools
            .iter()
            .map(|t| ToolPayload {
                r#type: "function",
                function: FunctionPayload {
                    name: &t.name,
                    description: &t.description,
                    parameters: &t.parameters,
                },
            })
            .collect(),
    )
}

fn decode_arguments(raw: serde_json::Value) -> serde_json::Value {
    match raw {
        serde_json::Value::Null => serde_json::Value::Object(Default::default()),
        serde_json::Value::String(text) if text.trim().is_empty() => {
            serde_json::Value::Object(Default::default())
        }
        serde_json::Value::String(text) => {
            serde_json::from_str(&text).unwrap_or(serde_json::Value::String(text))
        }
        other => other,
    }
}

fn decode_response(body: ChatResponse) -> Result<InferenceResponse, InferenceError> {
    let choice = body
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| InferenceError::ResponseFormat("response has no choices".into()))?;

    // Unparseable argument strings are kept verbatim; the registry rejects
    // anything that is not a JSON object.
    let tool_calls: Vec<ToolCall> = choice
        .message
        .tool_calls
        .into_iter()
        .enumerate()
        .map(|(i, tc)| {
            let arguments = decode_arguments(tc.function.arguments);
            ToolCall {
                id: if tc.id.is_empty() {
                    format!("call_{i}")
                } else {
                    tc.id
                },
                name: tc.function.name,
                arguments,
            }
        })
        .collect();

    let usage = body
        .usage
        .map(|u| TokenUsage {
            prompt_tokens: u.prompt_tokens,
            completion_tokens: u.completion_tokens,
            total_tokens: u.total_tokens,
        })
        .unwrap_or_default();

    Ok(InferenceResponse {
        content: choice.message.content,
        tool_calls,
        usage,
    })
}
