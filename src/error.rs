//! Error taxonomy for discovery, tool calls, inference and the two pipelines.

use std::time::Duration;
use thiserror::Error;

/// Tool discovery failures. Fatal at startup.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("tool server unreachable: {0}")]
    Connection(String),

    #[error("tool server rejected credentials (HTTP {status})")]
    Auth { status: u16 },

    #[error("tool server protocol error: {0}")]
    Protocol(String),

    #[error("tool discovery timed out after {0:?}")]
    Timeout(Duration),
}

/// Per-step tool failures. The agent loop turns every one of these into an
/// observation instead of aborting.
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("unknown tool '{0}'")]
    UnknownTool(String),

    #[error("invalid arguments for '{tool}': {reason}")]
    InvalidArguments { tool: String, reason: String },

    #[error("tool '{tool}' failed: {message}")]
    Invocation { tool: String, message: String },

    #[error("tool '{tool}' timed out after {after:?}")]
    Timeout { tool: String, after: Duration },
}

/// Model round-trip failures.
#[derive(Debug, Error)]
pub enum InferenceError {
    #[error("inference service unreachable: {0}")]
    Connection(String),

    #[error("inference failed ({status}): {body}")]
    Http { status: u16, body: String },

    #[error("inference timed out after {0:?}")]
    Timeout(Duration),

    #[error("unexpected inference response: {0}")]
    ResponseFormat(String),
}

/// Request-level investigation failures.
#[derive(Debug, Error)]
pub enum AgentError {
    #[error("investigation target must not be empty")]
    EmptyTarget,

    #[error("investigation exceeded {max_steps} tool steps")]
    StepLimitExceeded { max_steps: u32 },

    #[error("investigation exceeded {after:?} wall-clock budget")]
    TimeoutExceeded { after: Duration },

    #[error(transparent)]
    Inference(#[from] InferenceError),
}

/// Request-level validation failures.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error(transparent)]
    Inference(#[from] InferenceError),
}

impl From<reqwest::Error> for InferenceError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            Self::ResponseFormat(e.to_string())
        } else {
            Self::Connection(e.to_string())
        }
    }
}

impl From<reqwest::Error> for RegistryError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            Self::Protocol(e.to_string())
        } else {
            Self::Connection(e.to_string())
        }
    }
}
