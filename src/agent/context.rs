//! Conversation state for a single investigation run.

use crate::agent::system_prompt;
use crate::error::ToolError;
use crate::tools::ToolDefinition;
use crate::types::*;
use chrono::{DateTime, Utc};
use tracing::debug;

/// Per-request run state. Owned by one loop invocation and dropped with it.
#[derive(Debug)]
pub struct AgentRun {
    pub run_id: String,
    pub target: String,
    pub history: Vec<ChatMessage>,
    pub step_count: u32,
    pub state: RunState,
    pub started_at: DateTime<Utc>,
}

impl AgentRun {
    /// Seed the history with the system prompt and the investigation request.
    pub fn new(target: &str, tools: &[ToolDefinition]) -> Self {
        let history = vec![
            ChatMessage::system(system_prompt::build_system_prompt(tools)),
            ChatMessage::user(system_prompt::build_investigation_prompt(target)),
        ];
        Self {
            run_id: ulid::Ulid::new().to_string(),
            target: target.to_string(),
            history,
            step_count: 0,
            state: RunState::Reasoning,
            started_at: Utc::now(),
        }
    }

    pub fn transition(&mut self, next: RunState) {
        debug!("[{}] {} -> {}", self.run_id, self.state, next);
        self.state = next;
    }

    /// Append an observation for `call` and count the step.
    pub fn observe(&mut self, call: &ToolCall, outcome: &Result<String, ToolError>) {
        self.history
            .push(ChatMessage::tool(&call.id, render_observation(call, outcome)));
        self.step_count += 1;
    }

    pub fn metadata(&self) -> RunMetadata {
        RunMetadata {
            run_id: self.run_id.clone(),
            steps: self.step_count,
            started_at: self.started_at,
        }
    }
}

/// Observation text for the model. Failures are described, never forwarded raw.
pub fn render_observation(call: &ToolCall, outcome: &Result<String, ToolError>) -> String {
    match outcome {
        Ok(output) => format!("[{}] {}", call.name, output),
        Err(ToolError::UnknownTool(name)) => format!(
            "[{name}] Error: no tool named '{name}' exists. Choose one of the available tools."
        ),
        Err(ToolError::InvalidArguments { reason, .. }) => {
            format!("[{}] Error: invalid arguments ({reason}). Fix them and retry.", call.name)
        }
        Err(ToolError::Invocation { message, .. }) => {
            format!("[{}] Error: the tool call failed: {message}", call.name)
        }
        Err(ToolError::Timeout { after, .. }) => format!(
            "[{}] Error: the tool did not answer within {}s. You may retry or continue without it.",
            call.name,
            after.as_secs()
        ),
    }
}
